use crate::db::core::{Design, Net, PinRef};
use crate::db::tree::RoutingTree;
use crate::geom::coord::BinCoord;
use crate::grid::BinGrids;
use rayon::prelude::*;
use std::collections::VecDeque;

const CHECK_TOLERANCE: f64 = 1e-9;

pub fn run(design: &Design) -> Result<(), String> {
    log::info!("Starting Routing Verification");

    let Some(grids) = design.bins.as_ref() else {
        return Err("There are no bins to verify against".to_string());
    };

    let (tree_result, bins_result) = rayon::join(
        || check_trees(design, grids),
        || check_claimed_bins(design, grids),
    );

    let mut msgs = Vec::new();

    match tree_result {
        Err(e) => {
            log::error!("\x1b[31mFAIL\x1b[0m: Broken Routing Tree");
            log::error!("{}", e);
            msgs.push(e);
        }
        Ok(_) => log::info!("\x1b[32mPASS\x1b[0m: All routing trees are connected and orthogonal."),
    }

    match bins_result {
        Err(e) => {
            log::error!("\x1b[31mFAIL\x1b[0m: Claimed Bins Inconsistent");
            log::error!("{}", e);
            msgs.push(e);
        }
        Ok(_) => log::info!("\x1b[32mPASS\x1b[0m: No wire crosses a blockage."),
    }

    if msgs.is_empty() {
        log::info!("\x1b[32mSUCCESS\x1b[0m: VALID ROUTING");
        Ok(())
    } else {
        log::error!(
            "\x1b[31mFAILURE\x1b[0m: INVALID ROUTING ({} Errors)",
            msgs.len()
        );
        Err(msgs.join("; "))
    }
}

fn check_trees(design: &Design, grids: &BinGrids) -> Result<(), String> {
    let errors: Vec<String> = design
        .nets
        .par_iter()
        .filter_map(|net| {
            let tree = net.tree.as_ref()?;
            check_net_tree(design, grids, net, tree).err()
        })
        .collect();

    match errors.into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Structure, orthogonality and connectivity of one routed net.
pub fn check_net_tree(
    design: &Design,
    grids: &BinGrids,
    net: &Net,
    tree: &RoutingTree,
) -> Result<(), String> {
    tree.verify_structure()
        .map_err(|e| format!("Net '{}': {}", net.name, e))?;

    for (parent, child) in tree.edges() {
        let a = tree.position(parent);
        let b = tree.position(child);
        if (a.x - b.x).abs() > CHECK_TOLERANCE && (a.y - b.y).abs() > CHECK_TOLERANCE {
            return Err(format!(
                "Net '{}': diagonal edge '{}' ({:.3},{:.3}) -> '{}' ({:.3},{:.3})",
                net.name,
                tree.node(parent).name,
                a.x,
                a.y,
                tree.node(child).name,
                b.x,
                b.y
            ));
        }
    }

    let root_bin = tree.bin(tree.root());
    let reachable = reachable_bins(grids, root_bin);

    // A synthetic root means the declared source was routed as a drain.
    let mut endpoints: Vec<PinRef> = net
        .drains
        .iter()
        .copied()
        .filter(|&d| d != net.source)
        .collect();
    if tree.node(tree.root()).point.is_corner() {
        endpoints.push(net.source);
    }

    let mut partial = 0;
    for pin in endpoints {
        let Some(point) = design.pin_point(pin) else {
            return Err(format!("Net '{}': element without a bin", net.name));
        };
        if tree.find_element(point.kind).is_some() {
            continue;
        }
        if grids.is_blocked(point.bin) || !reachable[grids.blockages().index(point.bin)] {
            partial += 1;
            continue;
        }
        return Err(format!(
            "Net '{}': endpoint '{}' is reachable but not connected (split net)",
            net.name,
            pin_label(design, pin)
        ));
    }

    if partial > 0 {
        log::warn!(
            "Net '{}' is partially routed: {} endpoint(s) blocked or enclosed",
            net.name,
            partial
        );
    }
    Ok(())
}

fn pin_label(design: &Design, pin: PinRef) -> String {
    design.pin_name(pin).to_string()
}

fn reachable_bins(grids: &BinGrids, start: BinCoord) -> Vec<bool> {
    let grid = grids.blockages();
    let mut seen = vec![false; grid.len()];
    if grids.is_blocked(start) {
        return seen;
    }

    let mut queue = VecDeque::new();
    seen[grid.index(start)] = true;
    queue.push_back(start);

    while let Some(bin) = queue.pop_front() {
        let mut next = Vec::with_capacity(4);
        if bin.row > 0 {
            next.push(BinCoord::new(bin.row - 1, bin.col));
        }
        if bin.col + 1 < grid.cols() {
            next.push(BinCoord::new(bin.row, bin.col + 1));
        }
        if bin.row + 1 < grid.rows() {
            next.push(BinCoord::new(bin.row + 1, bin.col));
        }
        if bin.col > 0 {
            next.push(BinCoord::new(bin.row, bin.col - 1));
        }
        for n in next {
            let idx = grid.index(n);
            if !seen[idx] && !grids.is_blocked(n) {
                seen[idx] = true;
                queue.push_back(n);
            }
        }
    }
    seen
}

fn check_claimed_bins(design: &Design, grids: &BinGrids) -> Result<(), String> {
    let blocked = design.nets.par_iter().find_map_any(|net| {
        net.claimed_bins
            .iter()
            .find(|&&b| !grids.blockages().contains(b) || grids.is_blocked(b))
            .map(|b| format!("Net '{}' claims blocked bin {}", net.name, b))
    });
    if let Some(msg) = blocked {
        return Err(msg);
    }

    let claimed: u64 = design
        .nets
        .iter()
        .map(|n| n.claimed_bins.len() as u64)
        .sum();
    let occupancy = grids.occupancy().total();
    if claimed != occupancy {
        return Err(format!(
            "Net occupancy total {} does not match {} claimed bins",
            occupancy, claimed
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::core::{Core, PortSide};
    use crate::db::tree::NetPoint;
    use crate::geom::point::Point;

    fn two_port_design() -> Design {
        let mut design = Design::new(
            "check",
            Core {
                width: 4.0,
                height: 4.0,
                ..Default::default()
            },
        );
        let a = design
            .add_port("a".into(), Point::new(0.5, 0.5), PortSide::Left)
            .unwrap();
        let b = design
            .add_port("b".into(), Point::new(3.5, 3.5), PortSide::Right)
            .unwrap();
        design
            .add_net("n".into(), PinRef::Port(a), vec![PinRef::Port(b)])
            .unwrap();
        design.create_bins(4, 4).unwrap();
        design
    }

    fn l_shaped_tree(design: &Design, bend: Point<f64>) -> RoutingTree {
        let net = &design.nets[0];
        let mut tree = RoutingTree::new("a", design.pin_point(net.source).unwrap());
        let corner = tree.insert("n_1", NetPoint::corner(bend, BinCoord::new(0, 3)));
        let leaf = tree.insert("b", design.pin_point(net.drains[0]).unwrap());
        tree.add_child(tree.root(), corner);
        tree.add_child(corner, leaf);
        tree
    }

    #[test]
    fn test_orthogonal_tree_passes() {
        let mut design = two_port_design();
        design.nets[0].tree = Some(l_shaped_tree(&design, Point::new(3.5, 0.5)));
        assert!(run(&design).is_ok());
    }

    #[test]
    fn test_diagonal_edge_fails() {
        let mut design = two_port_design();
        design.nets[0].tree = Some(l_shaped_tree(&design, Point::new(3.0, 0.7)));
        let err = run(&design).unwrap_err();
        assert!(err.contains("diagonal"));
    }

    #[test]
    fn test_missing_reachable_drain_fails() {
        let mut design = two_port_design();
        let source = design.pin_point(design.nets[0].source).unwrap();
        design.nets[0].tree = Some(RoutingTree::new("a", source));
        assert!(run(&design).unwrap_err().contains("split net"));
    }

    #[test]
    fn test_blocked_claim_fails() {
        let mut design = two_port_design();
        design.set_blockage(BinCoord::new(1, 1), true).unwrap();
        design.nets[0].claimed_bins = vec![BinCoord::new(1, 1)];
        design
            .bins
            .as_mut()
            .unwrap()
            .increment_occupancy(BinCoord::new(1, 1));
        assert!(run(&design).unwrap_err().contains("blocked bin"));
    }
}
