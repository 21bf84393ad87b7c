use crate::error::FluidError;
use plotters::prelude::*;
use std::path::Path;

const FLOOR: f32 = 1.0e-12;

fn plot_err<E: std::fmt::Display>(e: E) -> FluidError {
    FluidError::Plot(e.to_string())
}

/// Write the residual history as a PNG line chart, one point per sub-step.
/// The y axis is log10 of the residual since it spans many decades.
pub fn residual_chart(history: &[f32], path: &Path, size: (u32, u32)) -> Result<(), FluidError> {
    if history.is_empty() {
        return Err(FluidError::Plot("no residuals recorded".into()));
    }
    let points: Vec<(f32, f32)> = history
        .iter()
        .enumerate()
        .map(|(i, r)| (i as f32, r.max(FLOOR).log10()))
        .filter(|(_, y)| y.is_finite())
        .collect();

    let (lo, hi) = points
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    // A flat history still needs a non-empty range.
    let (lo, hi) = if hi - lo < 1.0e-3 { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    if !(lo.is_finite() && hi.is_finite()) {
        return Err(FluidError::Plot("residual history holds no finite values".into()));
    }

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let x_max = (history.len().max(2) - 1) as f32;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(0f32..x_max, lo..hi)
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(points, &BLUE))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("residual chart written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_png() {
        let path = std::env::temp_dir().join(format!("stirbox-residual-{}.png", std::process::id()));
        let history: Vec<f32> = (0..50).map(|i| 100.0 * 0.8f32.powi(i)).collect();
        residual_chart(&history, &path, (320, 200)).unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_history_is_an_error() {
        let path = std::env::temp_dir().join("stirbox-never-written.png");
        assert!(matches!(residual_chart(&[], &path, (10, 10)), Err(FluidError::Plot(_))));
    }
}
