//! Input data model: the structured document handed over by the
//! language-model step. Names are the join keys and are matched
//! case-sensitively everywhere.

/// A visual cluster boundary (cloud provider, logical tier, ...).
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub kind: String,
}

/// A single renderable node.
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub kind: String,
    /// Declared group membership. A name that matches no declared group is
    /// treated as ungrouped.
    pub group: Option<String>,
    /// Preferred icon filename; subject to the resolver pipeline when it does
    /// not match an asset verbatim.
    pub icon_hint: Option<String>,
}

/// A directed, labeled edge. `from`/`to` reference a component or a group by
/// name; unresolvable endpoints make the edge skippable, never fatal.
#[derive(Debug, Clone)]
pub struct Connection {
    pub from: String,
    pub to: String,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct Diagram {
    pub groups: Vec<Group>,
    pub components: Vec<Component>,
    pub connections: Vec<Connection>,
}

impl Diagram {
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Components whose declared group matches `group_name`. Declaration
    /// order is preserved; layout relies on that for reproducibility.
    pub fn members(&self, group_name: &str) -> impl Iterator<Item = &Component> {
        self.components
            .iter()
            .filter(move |c| c.group.as_deref() == Some(group_name))
    }

    /// Components outside every declared group, including those whose group
    /// reference matches no declared group.
    pub fn ungrouped(&self) -> impl Iterator<Item = &Component> {
        self.components
            .iter()
            .filter(|c| match c.group.as_deref() {
                Some(name) => self.group(name).is_none(),
                None => true,
            })
    }
}
