use plotters::prelude::*;
use thiserror::Error;

use crate::domain::projection::ProjectionYearResult;

#[derive(Error, Debug)]
pub enum ProjectionPlotError {
    #[error("projection has no years to plot")]
    EmptyProjection,
    #[error("failed to render projection plot: {0}")]
    Plot(String),
}

/// Bar chart of projected totals per school year with the capacity line on top.
pub fn write_projection_png(
    output_path: &str,
    projection: &[ProjectionYearResult],
    school_max_capacity: u32,
) -> Result<(), ProjectionPlotError> {
    if projection.is_empty() {
        return Err(ProjectionPlotError::EmptyProjection);
    }

    let max_total = projection
        .iter()
        .map(|year| year.total_students + year.unresolved_excess)
        .max()
        .unwrap_or(0)
        .max(school_max_capacity);
    let max_y = (max_total as f64 * 1.1).ceil().max(1.0) as i32;
    let max_x = projection.len() as i32;

    let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ProjectionPlotError::Plot(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Projected Enrollment", ("sans-serif", 30))
        .x_label_area_size(55)
        .y_label_area_size(65)
        .build_cartesian_2d(0..max_x, 0..max_y)
        .map_err(|e| ProjectionPlotError::Plot(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("School year")
        .y_desc("Students")
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 22))
        .x_labels(projection.len().min(10))
        .x_label_formatter(&|index| {
            if *index < 0 {
                return String::new();
            }
            projection
                .get(*index as usize)
                .map(|year| year.school_year.clone())
                .unwrap_or_default()
        })
        .draw()
        .map_err(|e| ProjectionPlotError::Plot(e.to_string()))?;

    let bar_color = RGBColor(30, 122, 204);
    let constrained_color = RGBColor(214, 96, 39);
    chart
        .draw_series(projection.iter().enumerate().map(|(idx, year)| {
            let color = if year.was_capacity_constrained {
                constrained_color
            } else {
                bar_color
            };
            Rectangle::new(
                [(idx as i32, 0), (idx as i32 + 1, year.total_students as i32)],
                ShapeStyle::from(&color).filled().stroke_width(1),
            )
        }))
        .map_err(|e| ProjectionPlotError::Plot(e.to_string()))?;

    let capacity = school_max_capacity as i32;
    chart
        .draw_series(LineSeries::new(
            [(0, capacity), (max_x, capacity)],
            ShapeStyle::from(&BLACK).stroke_width(2),
        ))
        .map_err(|e| ProjectionPlotError::Plot(e.to_string()))?;

    root.present()
        .map_err(|e| ProjectionPlotError::Plot(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_projection_is_rejected() {
        let output_file = assert_fs::NamedTempFile::new("empty.png").unwrap();
        let error = write_projection_png(output_file.path().to_str().unwrap(), &[], 100)
            .expect_err("expected empty projection error");
        assert!(matches!(error, ProjectionPlotError::EmptyProjection));
    }
}
