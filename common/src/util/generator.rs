use crate::db::core::{PortSide, Row};
use crate::db::parser::design::{
    ComponentEntry, CoreEntry, DEFAULT_COMP_HEIGHT, DEFAULT_COMP_WIDTH, DesignFile, NetEntry,
    PortEntry,
};
use anyhow::Result;
use rand::Rng;
use rand::seq::SliceRandom;

const MAX_DRAINS: usize = 4;

/// Builds a random design with rows sized for the requested utilisation.
/// Components start unplaced at the core origin.
pub fn generate_random_design<R: Rng>(
    rng: &mut R,
    name: &str,
    num_components: usize,
    num_ports: usize,
    num_nets: usize,
    target_utilisation: f64,
) -> DesignFile {
    let util = target_utilisation.clamp(0.01, 0.99);
    let cell_area = DEFAULT_COMP_WIDTH * DEFAULT_COMP_HEIGHT;
    let required_area = (num_components.max(1) as f64) * cell_area / util;
    let side = required_area.sqrt();

    let num_rows = ((side / DEFAULT_COMP_HEIGHT).ceil() as usize).max(1);
    let core_h = num_rows as f64 * DEFAULT_COMP_HEIGHT;
    let core_w = (required_area / core_h).max(DEFAULT_COMP_WIDTH * 2.0);
    let offset = DEFAULT_COMP_HEIGHT * 2.0;

    log::info!(
        "Generating design '{}': {} components, {} ports, {} nets, core {:.3}x{:.3} (target util {:.1}%)",
        name,
        num_components,
        num_ports,
        num_nets,
        core_w,
        core_h,
        util * 100.0
    );

    let rows = (0..num_rows)
        .map(|i| Row {
            name: format!("row{}", i),
            site: "core".to_string(),
            x: offset,
            y: offset + i as f64 * DEFAULT_COMP_HEIGHT,
            width: core_w,
            height: DEFAULT_COMP_HEIGHT,
        })
        .collect();

    let layout_w = core_w + 2.0 * offset;
    let layout_h = core_h + 2.0 * offset;
    let sides = [PortSide::Left, PortSide::Bottom, PortSide::Right, PortSide::Top];
    let ports: Vec<PortEntry> = (0..num_ports)
        .map(|i| {
            let side = sides[i % sides.len()];
            let (x, y) = match side {
                PortSide::Left => (0.0, rng.gen_range(0.0..layout_h)),
                PortSide::Right => (layout_w, rng.gen_range(0.0..layout_h)),
                PortSide::Bottom => (rng.gen_range(0.0..layout_w), 0.0),
                PortSide::Top => (rng.gen_range(0.0..layout_w), layout_h),
            };
            PortEntry {
                name: format!("io{}", i),
                x,
                y,
                side,
            }
        })
        .collect();

    let components: Vec<ComponentEntry> = (0..num_components)
        .map(|i| ComponentEntry {
            name: format!("inst{}", i),
            cell_type: "NAND2_X1".to_string(),
            timing_type: "combinational".to_string(),
            x: offset,
            y: offset,
            width: DEFAULT_COMP_WIDTH,
            height: DEFAULT_COMP_HEIGHT,
        })
        .collect();

    let mut names: Vec<String> = ports
        .iter()
        .map(|p| p.name.clone())
        .chain(components.iter().map(|c| c.name.clone()))
        .collect();

    let mut nets = Vec::with_capacity(num_nets);
    if names.len() >= 2 {
        for i in 0..num_nets {
            names.shuffle(rng);
            let fanout = rng.gen_range(1..=MAX_DRAINS.min(names.len() - 1));
            nets.push(NetEntry {
                name: format!("net{}", i),
                source: names[0].clone(),
                drains: names[1..=fanout].to_vec(),
            });
        }
    }

    DesignFile {
        name: name.to_string(),
        core: CoreEntry {
            width: core_w,
            height: core_h,
            x_offset: offset,
            y_offset: offset,
            utilisation: util * 100.0,
            aspect_ratio: core_h / core_w,
        },
        rows,
        ports,
        components,
        nets,
    }
}

pub fn generate_random_design_file<R: Rng>(
    rng: &mut R,
    filename: &str,
    num_components: usize,
    num_ports: usize,
    num_nets: usize,
    target_utilisation: f64,
) -> Result<()> {
    let name = std::path::Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("random");
    let file = generate_random_design(
        rng,
        name,
        num_components,
        num_ports,
        num_nets,
        target_utilisation,
    );
    file.write(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generated_design_loads() {
        let mut rng = StdRng::seed_from_u64(7);
        let file = generate_random_design(&mut rng, "gen", 20, 4, 10, 0.5);
        assert_eq!(file.components.len(), 20);
        assert_eq!(file.nets.len(), 10);
        for net in &file.nets {
            assert!(!net.drains.is_empty() && net.drains.len() <= MAX_DRAINS);
            assert!(!net.drains.contains(&net.source));
        }

        let design = file.into_design().unwrap();
        let rows_height: f64 = design.rows.iter().map(|r| r.height).sum();
        assert!((rows_height - design.core.height).abs() < 1e-9);
    }
}
