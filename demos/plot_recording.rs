//! Compare both estimators on a recorded tilt sequence
//!
//! Replays `testdata/tilt_recording.csv` through the Kalman and the Madgwick
//! estimator and plots their roll and pitch against the true angles, with the
//! Kalman bias estimates underneath.
//!
//! Run with: `cargo run --example plot_recording`

use nalgebra::Vector3;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Deserialize;
use std::error::Error;
use std::ops::Range;
use tilt_fusion::{Estimator, EstimatorKind, EstimatorSettings, ImuSample, Orientation};

#[derive(Debug, Deserialize)]
struct SensorData {
    #[serde(rename = "Time (s)")]
    time: f32,
    #[serde(rename = "Gyroscope X (deg/s)")]
    gyro_x: f32,
    #[serde(rename = "Gyroscope Y (deg/s)")]
    gyro_y: f32,
    #[serde(rename = "Gyroscope Z (deg/s)")]
    gyro_z: f32,
    #[serde(rename = "Accelerometer X (g)")]
    accel_x: f32,
    #[serde(rename = "Accelerometer Y (g)")]
    accel_y: f32,
    #[serde(rename = "Accelerometer Z (g)")]
    accel_z: f32,
    #[serde(rename = "Roll (deg)")]
    roll: f32,
    #[serde(rename = "Pitch (deg)")]
    pitch: f32,
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut reader = csv::Reader::from_path("testdata/tilt_recording.csv")?;
    let mut sensor_data = Vec::new();
    for result in reader.deserialize() {
        let record: SensorData = result?;
        sensor_data.push(record);
    }
    println!("Processing {} sensor samples...", sensor_data.len());

    let mut kalman = Orientation::new();
    let mut madgwick = Orientation::with_settings(EstimatorSettings {
        kind: EstimatorKind::Madgwick,
        ..Default::default()
    });

    let mut kalman_angles = Vec::new();
    let mut madgwick_angles = Vec::new();
    let mut biases = Vec::new();
    let mut previous_time = 0.0;

    for (i, data) in sensor_data.iter().enumerate() {
        let sample = ImuSample::new(
            Vector3::new(data.gyro_x, data.gyro_y, data.gyro_z),
            Vector3::new(data.accel_x, data.accel_y, data.accel_z),
            data.time - previous_time,
        );
        previous_time = data.time;

        kalman.update(&sample)?;
        madgwick.update(&sample)?;

        let k = kalman.euler_degrees();
        let m = madgwick.euler_degrees();
        kalman_angles.push((k.roll, k.pitch));
        madgwick_angles.push((m.roll, m.pitch));

        if let Estimator::Kalman(axes) = kalman.estimator() {
            let bias = axes.biases();
            biases.push((bias.x, bias.y));
        }

        if i % 500 == 0 {
            println!(
                "t={:.2}s true=({:.1},{:.1}) kalman=({:.1},{:.1}) madgwick=({:.1},{:.1})",
                data.time, data.roll, data.pitch, k.roll, k.pitch, m.roll, m.pitch
            );
        }
    }

    create_plots(&sensor_data, &kalman_angles, &madgwick_angles, &biases)?;
    println!("✓ Plots saved to recording_plots.png");
    Ok(())
}

/// Roll, pitch and Kalman bias panels sharing the time axis
fn create_plots(
    sensor_data: &[SensorData],
    kalman_angles: &[(f32, f32)],
    madgwick_angles: &[(f32, f32)],
    biases: &[(f32, f32)],
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new("recording_plots.png", (1000, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((3, 1));

    let start = sensor_data.first().map_or(0.0, |d| d.time);
    let end = sensor_data.last().map_or(1.0, |d| d.time);
    let time_range = start..end;

    angle_panel(
        &panels[0],
        "Roll",
        time_range.clone(),
        sensor_data.iter().map(|d| (d.time, d.roll)),
        sensor_data
            .iter()
            .zip(kalman_angles)
            .map(|(d, a)| (d.time, a.0)),
        sensor_data
            .iter()
            .zip(madgwick_angles)
            .map(|(d, a)| (d.time, a.0)),
    )?;
    angle_panel(
        &panels[1],
        "Pitch",
        time_range.clone(),
        sensor_data.iter().map(|d| (d.time, d.pitch)),
        sensor_data
            .iter()
            .zip(kalman_angles)
            .map(|(d, a)| (d.time, a.1)),
        sensor_data
            .iter()
            .zip(madgwick_angles)
            .map(|(d, a)| (d.time, a.1)),
    )?;

    let mut bias_chart = ChartBuilder::on(&panels[2])
        .caption("Kalman gyroscope bias", ("sans-serif", 18))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range, -2f32..2f32)?;

    bias_chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("deg/s")
        .draw()?;

    bias_chart
        .draw_series(LineSeries::new(
            sensor_data.iter().zip(biases).map(|(d, b)| (d.time, b.0)),
            &RED,
        ))?
        .label("Roll bias")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RED));

    bias_chart
        .draw_series(LineSeries::new(
            sensor_data.iter().zip(biases).map(|(d, b)| (d.time, b.1)),
            &GREEN,
        ))?
        .label("Pitch bias")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], GREEN));

    bias_chart.configure_series_labels().draw()?;

    root.present()?;
    Ok(())
}

fn angle_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    time_range: Range<f32>,
    truth: impl Iterator<Item = (f32, f32)>,
    kalman: impl Iterator<Item = (f32, f32)>,
    madgwick: impl Iterator<Item = (f32, f32)>,
) -> Result<(), Box<dyn Error>> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(5)
        .x_label_area_size(0)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range, -30f32..30f32)?;

    chart.configure_mesh().y_desc("Degrees").draw()?;

    chart
        .draw_series(LineSeries::new(truth, &BLACK))?
        .label("True")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLACK));

    chart
        .draw_series(LineSeries::new(kalman, &RED))?
        .label("Kalman")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RED));

    chart
        .draw_series(LineSeries::new(madgwick, &BLUE))?
        .label("Madgwick")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLUE));

    chart.configure_series_labels().draw()?;
    Ok(())
}
