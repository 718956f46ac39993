use crate::vision::detector::{BoundingBox, Detection};
use image::{Rgb, RgbImage};

const BOX_THICKNESS: u32 = 2;

/// Fixed palette; a label always gets the same colour within a clip.
const PALETTE: &[[u8; 3]] = &[
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [26, 147, 52],
    [0, 212, 187],
    [44, 153, 168],
    [0, 194, 255],
];

pub fn color_for(label: &str) -> Rgb<u8> {
    let idx = label.bytes().fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    Rgb(PALETTE[idx % PALETTE.len()])
}

/// Draw every detection's box onto the frame in place.
pub fn annotate(frame: &mut RgbImage, detections: &[Detection]) {
    for det in detections {
        if let Some(bbox) = det.bbox {
            draw_box(frame, bbox, color_for(&det.label));
        }
    }
}

/// Rectangle outline clamped to the frame. Degenerate boxes are skipped.
pub fn draw_box(frame: &mut RgbImage, bbox: BoundingBox, color: Rgb<u8>) {
    let (w, h) = frame.dimensions();
    if w == 0 || h == 0 {
        return;
    }

    let clamp_x = |v: f32| (v.max(0.0) as u32).min(w - 1);
    let clamp_y = |v: f32| (v.max(0.0) as u32).min(h - 1);
    let (x1, x2) = (clamp_x(bbox.x1.min(bbox.x2)), clamp_x(bbox.x1.max(bbox.x2)));
    let (y1, y2) = (clamp_y(bbox.y1.min(bbox.y2)), clamp_y(bbox.y1.max(bbox.y2)));
    if x1 == x2 || y1 == y2 {
        return;
    }

    for t in 0..BOX_THICKNESS {
        let top = (y1 + t).min(y2);
        let bottom = y2.saturating_sub(t).max(y1);
        for x in x1..=x2 {
            frame.put_pixel(x, top, color);
            frame.put_pixel(x, bottom, color);
        }
        let left = (x1 + t).min(x2);
        let right = x2.saturating_sub(t).max(x1);
        for y in y1..=y2 {
            frame.put_pixel(left, y, color);
            frame.put_pixel(right, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str, bbox: Option<BoundingBox>) -> Detection {
        Detection { label: label.to_string(), confidence: 0.9, bbox }
    }

    #[test]
    fn draws_outline_only() {
        let mut frame = RgbImage::new(20, 20);
        let bbox = BoundingBox { x1: 5.0, y1: 5.0, x2: 15.0, y2: 15.0 };
        annotate(&mut frame, &[det("headlight", Some(bbox))]);

        let color = color_for("headlight");
        assert_eq!(*frame.get_pixel(5, 5), color);
        assert_eq!(*frame.get_pixel(15, 10), color);
        assert_eq!(*frame.get_pixel(10, 10), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn out_of_bounds_boxes_are_clamped() {
        let mut frame = RgbImage::new(10, 10);
        let bbox = BoundingBox { x1: -4.0, y1: -4.0, x2: 400.0, y2: 400.0 };
        annotate(&mut frame, &[det("tire", Some(bbox))]);
        assert_eq!(*frame.get_pixel(9, 9), color_for("tire"));
    }

    #[test]
    fn detections_without_boxes_leave_frame_untouched() {
        let mut frame = RgbImage::new(8, 8);
        let before = frame.clone();
        annotate(&mut frame, &[det("smoke", None)]);
        assert_eq!(frame, before);
    }
}
