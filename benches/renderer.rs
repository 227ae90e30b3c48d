use std::hint::black_box;

use archviz::{compute_layout, render_svg, Config, Connection, Component, Diagram, Group, IconLibrary, LayoutStrategy};
use criterion::{criterion_group, criterion_main, Criterion};

fn synthetic_diagram(groups: usize, per_group: usize) -> Diagram {
    let mut diagram = Diagram::default();
    for g in 0..groups {
        diagram.groups.push(Group {
            name: format!("Tier {g}"),
            kind: "tier".to_string(),
        });
        for c in 0..per_group {
            diagram.components.push(Component {
                name: format!("svc-{g}-{c}"),
                kind: ["api", "database", "queue", "worker"][c % 4].to_string(),
                group: Some(format!("Tier {g}")),
                icon_hint: None,
            });
        }
    }
    for g in 1..groups {
        for c in 0..per_group {
            diagram.connections.push(Connection {
                from: format!("svc-{}-{c}", g - 1),
                to: format!("svc-{g}-{c}"),
                label: "calls".to_string(),
            });
        }
    }
    diagram
}

fn bench_render(c: &mut Criterion) {
    let diagram = synthetic_diagram(4, 8);
    let icons = IconLibrary::empty();

    for strategy in [LayoutStrategy::Rows, LayoutStrategy::Grid] {
        let mut config = Config::default();
        config.layout.strategy = strategy;
        c.bench_function(&format!("layout_and_render_{strategy:?}"), |b| {
            b.iter(|| {
                let layout = compute_layout(
                    black_box(&diagram),
                    &icons,
                    &config.theme,
                    &config.layout,
                );
                black_box(render_svg(&layout, &config.theme, &config.layout).svg)
            })
        });
    }
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
