//! Diagnostic charts
//!
//! Charts are observability output only. Callers go through
//! [`render_or_warn`], so a failed render is logged and never changes a
//! feature test's verdict.

use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

type PlotResult = Result<(), Box<dyn Error>>;

const SIZE: (u32, u32) = (1200, 800);

fn svg_root(out_path: &Path) -> SVGBackend<'_> {
    tracing::debug!("write {}", out_path.display());
    SVGBackend::new(out_path, SIZE)
}

/// Run a render and downgrade any failure to a warning
///
/// Returns whether the chart was written.
pub fn render_or_warn<F>(out_path: &Path, render: F) -> bool
where
    F: FnOnce(&Path) -> PlotResult,
{
    match render(out_path) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to render {}: {}", out_path.display(), e);
            false
        }
    }
}

/// `(min, max)` of finite values, padded so the range is never empty
fn padded_range<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for &v in values {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if (hi - lo).abs() < 1e-9 {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Actual and expected series against timestep
pub fn series_comparison(
    out_path: &Path,
    title: &str,
    actual: &[f64],
    expected: &[f64],
    y_desc: &str,
) -> PlotResult {
    let steps = actual.len().max(expected.len()).max(1);
    let (y_min, y_max) = padded_range(actual.iter().chain(expected.iter()));

    let root = svg_root(out_path).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0f64..steps as f64, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("timestep")
        .y_desc(y_desc)
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            actual.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            &BLUE,
        ))?
        .label("actual")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(
            expected.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            &RED,
        ))?
        .label("expected")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Normalised histogram of a sample with the expected density overlaid
pub fn histogram_with_pdf<F: Fn(f64) -> f64>(
    out_path: &Path,
    title: &str,
    sample: &[f64],
    pdf: F,
    bins: usize,
) -> PlotResult {
    if sample.is_empty() {
        return Err("empty sample".into());
    }
    let bins = bins.max(1);
    let (x_min, x_max) = padded_range(sample.iter());
    let width = (x_max - x_min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in sample.iter().filter(|v| v.is_finite()) {
        let idx = (((v - x_min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let n = sample.len() as f64;
    let densities: Vec<f64> = counts.iter().map(|c| *c as f64 / (n * width)).collect();

    let curve: Vec<(f64, f64)> = (0..=200)
        .map(|i| {
            let x = x_min + (x_max - x_min) * i as f64 / 200.0;
            (x, pdf(x))
        })
        .filter(|(_, y)| y.is_finite())
        .collect();

    let y_max = densities
        .iter()
        .copied()
        .chain(curve.iter().map(|(_, y)| *y))
        .fold(0.0f64, f64::max)
        .max(1e-9)
        * 1.1;

    let root = svg_root(out_path).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0.0f64..y_max)?;

    chart.configure_mesh().x_desc("value").y_desc("density").draw()?;

    chart.draw_series(densities.iter().enumerate().map(|(i, d)| {
        let left = x_min + i as f64 * width;
        Rectangle::new([(left, 0.0), (left + width, *d)], BLUE.mix(0.4).filled())
    }))?;

    chart
        .draw_series(LineSeries::new(curve, &RED))?
        .label("expected pdf")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Empirical CDF of a sample against the expected CDF
pub fn cdf_overlay<F: Fn(f64) -> f64>(out_path: &Path, title: &str, sample: &[f64], cdf: F) -> PlotResult {
    let mut sorted: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Err("empty sample".into());
    }
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    let (x_min, x_max) = padded_range(sorted.iter());

    let mut empirical = Vec::with_capacity(sorted.len() * 2);
    for (i, &x) in sorted.iter().enumerate() {
        empirical.push((x, i as f64 / n));
        empirical.push((x, (i + 1) as f64 / n));
    }
    let expected: Vec<(f64, f64)> = (0..=200)
        .map(|i| {
            let x = x_min + (x_max - x_min) * i as f64 / 200.0;
            (x, cdf(x))
        })
        .collect();

    let root = svg_root(out_path).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0.0f64..1.05f64)?;

    chart.configure_mesh().x_desc("value").y_desc("F(x)").draw()?;

    chart
        .draw_series(LineSeries::new(empirical, &BLUE))?
        .label("empirical")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(expected, &RED))?
        .label("expected")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_series_comparison_writes_svg() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("series.svg");
        let written = render_or_warn(&path, |p| {
            series_comparison(p, "New Infections", &[1.0, 4.0, 2.0], &[1.5, 3.0, 2.5], "count")
        });
        assert!(written);
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_cdf_overlay_writes_svg() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cdf.svg");
        let sample = [0.2, 0.5, 0.9, 1.4, 2.0];
        assert!(render_or_warn(&path, |p| cdf_overlay(p, "cdf", &sample, |x| 1.0 - (-x).exp())));
        assert!(path.exists());
    }

    #[test]
    fn test_histogram_writes_svg() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hist.svg");
        let sample = [1.0, 1.0, 2.0, 3.0, 3.5];
        assert!(render_or_warn(&path, |p| histogram_with_pdf(p, "hist", &sample, |_| 0.3, 4)));
    }

    #[test]
    fn test_failures_are_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.svg");
        assert!(!render_or_warn(&path, |p| cdf_overlay(p, "cdf", &[], |x| x)));

        let bad_dir = temp_dir.path().join("missing").join("x.svg");
        assert!(!render_or_warn(&bad_dir, |p| series_comparison(p, "t", &[1.0], &[1.0], "y")));
    }

    #[test]
    fn test_padded_range_degenerate() {
        assert_eq!(padded_range([0.0, 0.0].iter()), (-1.0, 1.0));
        assert_eq!(padded_range([f64::NAN].iter()), (0.0, 1.0));
    }
}
