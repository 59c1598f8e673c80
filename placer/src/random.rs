//! Random row placement: every component lands at a random x in a random
//! row, retrying until it overlaps nothing already placed in that row.

use lee_common::db::core::{Design, DesignError};
use lee_common::db::indices::ComponentId;
use lee_common::geom::point::Point;
use lee_common::geom::rect::Rect;
use lee_common::geom::rtree::SpatialIndex;
use lee_common::util::profiler::ScopedTimer;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("design has no rows to place components in")]
    NoRows,
    #[error("could not place component '{name}' ({index}/{total}) after {tries} tries")]
    Failed {
        name: String,
        index: usize,
        total: usize,
        tries: usize,
    },
    #[error(transparent)]
    Design(#[from] DesignError),
}

pub fn random_placer<R: Rng>(
    design: &mut Design,
    tries: usize,
    rng: &mut R,
) -> Result<(), PlacementError> {
    if design.rows.is_empty() {
        return Err(PlacementError::NoRows);
    }
    let _timer = ScopedTimer::new("Random Placement");
    let total = design.num_components();
    log::info!(
        "Placing {} components in {} rows ({} tries each)",
        total,
        design.rows.len(),
        tries
    );

    if design.is_routed || design.nets.iter().any(|n| n.is_routed()) {
        log::warn!("Discarding existing routes before placement");
        design.reset_routing();
    }

    let mut occupied: Vec<SpatialIndex> = design.rows.iter().map(|_| SpatialIndex::new()).collect();

    for i in 0..total {
        let (width, height) = {
            let comp = &design.components[i];
            (comp.width, comp.height)
        };

        let mut placed = None;
        for _ in 0..tries {
            let r = rng.gen_range(0..design.rows.len());
            let row = &design.rows[r];
            let max_x = row.x + row.width - width;
            if max_x < row.x {
                continue;
            }
            let x = rng.gen_range(row.x..=max_x);
            let rect = Rect::new(Point::new(x, row.y), Point::new(x + width, row.y + height));
            if occupied[r].query_overlapping(rect).is_empty() {
                occupied[r].insert(rect, i);
                placed = Some(Point::new(x, row.y));
                break;
            }
        }

        let Some(position) = placed else {
            log::error!("Failed at {}/{}", i + 1, total);
            return Err(PlacementError::Failed {
                name: design.components[i].name.clone(),
                index: i + 1,
                total,
                tries,
            });
        };
        design.set_component_position(ComponentId::new(i), position);
    }

    if design.bins.is_some() {
        design.update_bins()?;
    }
    log::info!("Placed {} components", total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lee_common::db::core::{Core, Row};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn design_with_rows(rows: usize, row_width: f64, cells: usize) -> Design {
        let mut design = Design::new(
            "place",
            Core {
                width: row_width,
                height: rows as f64,
                ..Default::default()
            },
        );
        for r in 0..rows {
            design.add_row(Row {
                name: format!("row{}", r),
                site: "core".into(),
                x: 0.0,
                y: r as f64,
                width: row_width,
                height: 1.0,
            });
        }
        for c in 0..cells {
            design
                .add_component(format!("u{}", c), "INV".into(), 1.0, 1.0)
                .unwrap();
        }
        design
    }

    #[test]
    fn test_components_do_not_overlap() {
        let mut design = design_with_rows(3, 10.0, 12);
        let mut rng = StdRng::seed_from_u64(42);
        random_placer(&mut design, 100_000, &mut rng).unwrap();

        let rects: Vec<Rect> = design
            .components
            .iter()
            .map(|c| {
                Rect::new(
                    c.position,
                    Point::new(c.position.x + c.width, c.position.y + c.height),
                )
            })
            .collect();
        for (i, a) in rects.iter().enumerate() {
            assert!(a.min.x >= 0.0 && a.max.x <= 10.0);
            assert!(design.rows.iter().any(|r| r.y == a.min.y));
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_full_rows_fail() {
        // Cells as wide as the rows: one per row fits, the third cannot.
        let mut design = design_with_rows(2, 2.0, 0);
        for c in 0..3 {
            design
                .add_component(format!("w{}", c), "BUF".into(), 2.0, 1.0)
                .unwrap();
        }
        let mut rng = StdRng::seed_from_u64(1);
        let err = random_placer(&mut design, 200, &mut rng).unwrap_err();
        assert!(matches!(err, PlacementError::Failed { index: 3, total: 3, .. }));
    }

    #[test]
    fn test_bins_follow_placement() {
        let mut design = design_with_rows(4, 8.0, 6);
        design.create_bins(4, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        random_placer(&mut design, 100_000, &mut rng).unwrap();

        let grids = design.bins.as_ref().unwrap();
        for comp in &design.components {
            assert_eq!(comp.bin, Some(grids.coordinate_to_bin(comp.center())));
        }
        assert_eq!(grids.elements().total(), 6);
    }

    #[test]
    fn test_no_rows() {
        let mut design = design_with_rows(0, 4.0, 1);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            random_placer(&mut design, 10, &mut rng),
            Err(PlacementError::NoRows)
        ));
    }
}
