//! Plotters-powered rolling correlation chart widget for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer using `plotters-ratatui-backend`.

use chrono::NaiveDate;
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only line chart of one pair's rolling correlation.
///
/// `points` are `(index, value)` with `index` into `dates`; bounds are computed
/// outside the render call.
pub struct RollingPlottersChart<'a> {
    pub points: &'a [(f64, f64)],
    /// Date of each x index, used for tick labels.
    pub dates: &'a [NaiveDate],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub y_label: &'a str,
}

impl<'a> Widget for RollingPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let dates = self.dates;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(self.y_label)
                .x_labels(4)
                .y_labels(5)
                .x_label_formatter(&|v| date_label(dates, *v))
                .y_label_formatter(&|v| format!("{v:.1}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // Zero line first so the series draws over it.
            let zero_color = RGBColor(128, 128, 128);
            chart.draw_series(LineSeries::new([(x0, 0.0), (x1, 0.0)], &zero_color))?;

            let line_color = RGBColor(0, 255, 255); // cyan
            chart.draw_series(LineSeries::new(self.points.iter().copied(), &line_color))?;

            // Dots at each sample; `Circle` radii are mis-scaled by the backend.
            chart.draw_series(self.points.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// `MM-DD` label for the date nearest to x index `v`.
pub fn date_label(dates: &[NaiveDate], v: f64) -> String {
    if !v.is_finite() || v < 0.0 {
        return String::new();
    }
    dates
        .get(v.round() as usize)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_label_picks_nearest_index() {
        let dates = [
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
        ];
        assert_eq!(date_label(&dates, 0.2), "07-01");
        assert_eq!(date_label(&dates, 0.8), "07-02");
        assert_eq!(date_label(&dates, 5.0), "");
        assert_eq!(date_label(&dates, -1.0), "");
    }
}
