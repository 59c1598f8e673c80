use lee_common::db::core::{Design, Net};
use lee_common::db::indices::NetId;
use lee_common::geom::point::Point;
use lee_common::geom::rect::Rect;

fn net_bbox(design: &Design, net: &Net) -> Rect {
    let pins = std::iter::once(net.source).chain(net.drains.iter().copied());
    let source = design.pin_position(net.source);
    Rect::bounding(pins.map(|p| design.pin_position(p))).unwrap_or(Rect::new(source, source))
}

/// Center of the bounding box of the net's source and drains.
pub fn calculate_bb_center(design: &Design, net: NetId) -> Point<f64> {
    net_bbox(design, &design.nets[net.index()]).center()
}

/// Half-perimeter of the net's bounding box.
pub fn calculate_net_hpwl(design: &Design, net: NetId) -> f64 {
    net_bbox(design, &design.nets[net.index()]).half_perimeter()
}

pub fn calculate_hpwl(design: &Design) -> f64 {
    design
        .nets
        .iter()
        .map(|net| net_bbox(design, net).half_perimeter())
        .sum()
}

/// Sum of the Manhattan lengths of the tree edges; zero while unrouted.
pub fn calculate_net_tree_wirelength(net: &Net) -> f64 {
    let Some(tree) = net.tree.as_ref() else {
        return 0.0;
    };
    tree.edges()
        .into_iter()
        .map(|(parent, child)| tree.position(parent).manhattan(tree.position(child)))
        .sum()
}

pub fn calculate_tree_wirelength(design: &Design) -> f64 {
    design.nets.iter().map(calculate_net_tree_wirelength).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lee_common::db::core::{Core, PinRef, PortSide};
    use lee_common::db::tree::{NetPoint, RoutingTree};
    use lee_common::geom::coord::BinCoord;

    fn design() -> Design {
        let mut design = Design::new(
            "wl",
            Core {
                width: 10.0,
                height: 10.0,
                ..Default::default()
            },
        );
        let a = design
            .add_port("a".into(), Point::new(1.0, 1.0), PortSide::Left)
            .unwrap();
        let u = design.add_component("u".into(), "INV".into(), 2.0, 2.0).unwrap();
        design.set_component_position(u, Point::new(6.0, 3.0));
        design
            .add_net("n".into(), PinRef::Port(a), vec![PinRef::Component(u)])
            .unwrap();
        design
    }

    #[test]
    fn test_hpwl_uses_component_centers() {
        let design = design();
        let net = NetId::new(0);
        // Center of u is (7, 4).
        assert_eq!(calculate_net_hpwl(&design, net), 9.0);
        assert_eq!(calculate_hpwl(&design), 9.0);
        assert_eq!(calculate_bb_center(&design, net), Point::new(4.0, 2.5));
    }

    #[test]
    fn test_tree_wirelength() {
        let mut design = design();
        assert_eq!(calculate_tree_wirelength(&design), 0.0);

        let mut tree = RoutingTree::new(
            "a",
            NetPoint::corner(Point::new(1.0, 1.0), BinCoord::default()),
        );
        let bend = tree.insert("n_1", NetPoint::corner(Point::new(7.0, 1.0), BinCoord::default()));
        let end = tree.insert("u", NetPoint::corner(Point::new(7.0, 4.0), BinCoord::default()));
        tree.add_child(tree.root(), bend);
        tree.add_child(bend, end);
        design.nets[0].tree = Some(tree);

        assert_eq!(calculate_net_tree_wirelength(&design.nets[0]), 9.0);
        assert_eq!(calculate_tree_wirelength(&design), 9.0);
    }
}
