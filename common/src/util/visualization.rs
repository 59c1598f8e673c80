use crate::db::core::Design;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as ImageRect;
use std::path::Path;

pub fn draw_placement(design: &Design, filename: &str, width: u32, height: u32) {
    let mut img = RgbImage::from_pixel(width, height, Rgb([20, 20, 20]));

    let (layout_w, layout_h) = design.core.layout_size();
    if layout_w <= 0.0 || layout_h <= 0.0 {
        return;
    }

    let scale_x = width as f64 / layout_w;
    let scale_y = height as f64 / layout_h;
    let map = |x: f64, y: f64| (x * scale_x, height as f64 - y * scale_y);

    let color_row = Rgb([45, 45, 55]);
    for row in &design.rows {
        let (x, y_bot) = map(row.x, row.y);
        let w = (row.width * scale_x).max(1.0);
        let h = (row.height * scale_y).max(1.0);
        let rect = ImageRect::at(x as i32, (y_bot - h) as i32).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(&mut img, rect, color_row);
    }

    let color_cell = Rgb([180, 60, 60]);
    for comp in &design.components {
        let (x, y_bot) = map(comp.position.x, comp.position.y);
        let w = (comp.width * scale_x).max(2.0);
        let h = (comp.height * scale_y).max(2.0);
        let rect = ImageRect::at(x as i32, (y_bot - h) as i32).of_size(w as u32, h as u32);
        draw_filled_rect_mut(&mut img, rect, color_cell);
    }

    let color_port = Rgb([240, 200, 40]);
    for port in &design.ports {
        let (px, py) = map(port.position.x, port.position.y);
        let rect = ImageRect::at(px as i32 - 2, py as i32 - 2).of_size(5, 5);
        draw_filled_rect_mut(&mut img, rect, color_port);
    }

    if let Err(e) = img.save(Path::new(filename)) {
        log::warn!("Could not write {}: {}", filename, e);
    }
}

/// Net-occupancy heatmap with blockages and every routing tree drawn on top.
pub fn draw_heatmap(design: &Design, filename: &str, width: u32, height: u32) {
    let Some(grids) = design.bins.as_ref() else {
        log::warn!("There are no bins to draw");
        return;
    };

    let mut img = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));

    let (layout_w, layout_h) = design.core.layout_size();
    if layout_w <= 0.0 || layout_h <= 0.0 {
        return;
    }

    let scale_x = width as f64 / layout_w;
    let scale_y = height as f64 / layout_h;
    let map = |x: f64, y: f64| (x * scale_x, height as f64 - y * scale_y);

    let bin_w = grids.converter().bin_width() * scale_x;
    let bin_h = grids.converter().bin_height() * scale_y;
    let max_occ = grids.occupancy().max().max(1) as f64;

    for (bin, occ) in grids.occupancy().iter() {
        let x = bin.col as f64 * bin_w;
        let y_top = height as f64 - (bin.row as f64 + 1.0) * bin_h;
        let rect = ImageRect::at(x as i32, y_top as i32)
            .of_size(bin_w.ceil().max(1.0) as u32, bin_h.ceil().max(1.0) as u32);

        let color = if grids.is_blocked(bin) {
            Rgb([110, 110, 110])
        } else {
            heat_color(occ as f64 / max_occ)
        };
        draw_filled_rect_mut(&mut img, rect, color);
    }

    let wire_color = Rgb([0, 240, 255]);
    for net in &design.nets {
        let Some(tree) = net.tree.as_ref() else {
            continue;
        };
        for (parent, child) in tree.edges() {
            let a = tree.position(parent);
            let b = tree.position(child);
            let (x1, y1) = map(a.x, a.y);
            let (x2, y2) = map(b.x, b.y);
            draw_line_segment_mut(
                &mut img,
                (x1 as f32, y1 as f32),
                (x2 as f32, y2 as f32),
                wire_color,
            );
        }
    }

    let pin_color = Rgb([255, 255, 255]);
    let points = design
        .ports
        .iter()
        .map(|p| p.position)
        .chain(design.components.iter().map(|c| c.center()));
    for p in points {
        let (px, py) = map(p.x, p.y);
        let rect = ImageRect::at(px as i32 - 1, py as i32 - 1).of_size(3, 3);
        draw_filled_rect_mut(&mut img, rect, pin_color);
    }

    if let Err(e) = img.save(Path::new(filename)) {
        log::warn!("Could not write {}: {}", filename, e);
    }
}

/// Dark blue at 0, through red, to yellow at 1.
fn heat_color(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    if t == 0.0 {
        return Rgb([10, 10, 40]);
    }
    let r = (255.0 * (t * 2.0).min(1.0)) as u8;
    let g = (255.0 * (t * 2.0 - 1.0).max(0.0)) as u8;
    let b = (120.0 * (1.0 - t)) as u8;
    Rgb([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_color_endpoints() {
        assert_eq!(heat_color(0.0), Rgb([10, 10, 40]));
        assert_eq!(heat_color(1.0), Rgb([255, 255, 0]));
        assert_eq!(heat_color(0.5).0[0], 255);
    }
}
