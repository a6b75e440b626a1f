use std::f64::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Polygon, Text};

use crate::view::ViewModel;

// ---------------------------------------------------------------------------
// Donut geometry
// ---------------------------------------------------------------------------

const OUTER_RADIUS: f64 = 1.0;
/// Hole size as a fraction of the outer radius.
const HOLE: f64 = 0.3;
/// Largest angle covered by one filled quad. egui fills convex shapes only, so
/// each slice is drawn as a fan of thin quads.
const MAX_STEP: f64 = TAU / 180.0;
/// Slices smaller than this share (percent) get no inside label.
const MIN_LABEL_PERCENT: f64 = 4.0;

/// Start and end angle (radians) of every slice. The first slice starts at
/// twelve o'clock and slices run clockwise.
pub fn slice_angles(values: &[usize]) -> Vec<(f64, f64)> {
    let total: usize = values.iter().sum();
    if total == 0 {
        return Vec::new();
    }
    let mut acc = 0usize;
    values
        .iter()
        .map(|&v| {
            let start = FRAC_PI_2 - TAU * acc as f64 / total as f64;
            acc += v;
            let end = FRAC_PI_2 - TAU * acc as f64 / total as f64;
            (start, end)
        })
        .collect()
}

fn polar(angle: f64, radius: f64) -> [f64; 2] {
    [radius * angle.cos(), radius * angle.sin()]
}

/// Split the ring section between `start` and `end` into convex quads.
pub fn ring_quads(start: f64, end: f64, inner: f64, outer: f64) -> Vec<[[f64; 2]; 4]> {
    let sweep = end - start;
    let steps = (sweep.abs() / MAX_STEP - 1e-9).ceil().max(1.0) as usize;
    (0..steps)
        .map(|i| {
            let a0 = start + sweep * i as f64 / steps as f64;
            let a1 = start + sweep * (i + 1) as f64 / steps as f64;
            [
                polar(a0, inner),
                polar(a0, outer),
                polar(a1, outer),
                polar(a1, inner),
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Chart (central panel)
// ---------------------------------------------------------------------------

/// Render the view as a donut chart with a legend and inside labels.
pub fn donut_chart(ui: &mut Ui, view: &ViewModel, height: f32) {
    let values: Vec<usize> = view.slices.iter().map(|s| s.value).collect();
    let angles = slice_angles(&values);
    let inner = OUTER_RADIUS * HOLE;

    Plot::new("donut_chart")
        .legend(Legend::default())
        .height(height)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for (slice, &(start, end)) in view.slices.iter().zip(&angles) {
                let color = slice.color.to_color32();

                // Quads share the slice name so the legend shows one entry.
                for quad in ring_quads(start, end, inner, OUTER_RADIUS) {
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(quad.to_vec()))
                            .name(&slice.label)
                            .fill_color(color)
                            .stroke(Stroke::new(0.5, color)),
                    );
                }

                // White separator at the slice start.
                if angles.len() > 1 {
                    plot_ui.line(
                        Line::new(PlotPoints::from(vec![
                            polar(start, inner),
                            polar(start, OUTER_RADIUS),
                        ]))
                        .color(Color32::WHITE)
                        .width(1.0),
                    );
                }

                if slice.percentage >= MIN_LABEL_PERCENT {
                    let [x, y] = polar((start + end) / 2.0, (inner + OUTER_RADIUS) / 2.0);
                    plot_ui.text(Text::new(
                        PlotPoint::new(x, y),
                        RichText::new(format!("{}\n{:.1}%", slice.label, slice.percentage))
                            .color(Color32::WHITE)
                            .size(10.0),
                    ));
                }
            }
        });
}
