use nalgebra::Vector3;
use tilt_fusion::{EstimatorKind, EstimatorSettings, ImuSample, Orientation};

const SAMPLE_PERIOD: f32 = 0.01; // 10 ms sample period

fn main() {
    for kind in [EstimatorKind::Kalman, EstimatorKind::Madgwick] {
        let mut orientation = Orientation::with_settings(EstimatorSettings {
            kind,
            ..Default::default()
        });
        println!("{:?}", kind);

        for _ in 0..10 {
            // this loop should repeat each time new gyroscope data is available
            // replace these with actual gyroscope data in degrees/s and
            // accelerometer data in g
            let gyroscope = Vector3::new(0.0, 0.0, 0.0);
            let accelerometer = Vector3::new(0.0, 0.0, 1.0);

            let sample = ImuSample::new(gyroscope, accelerometer, SAMPLE_PERIOD);
            if let Err(error) = orientation.update(&sample) {
                eprintln!("sample rejected: {}", error);
                continue;
            }

            let angles = orientation.euler_degrees();
            println!(
                "Roll: {:.2}, Pitch: {:.2}, Yaw: {:.2}",
                angles.roll, angles.pitch, angles.yaw
            );
        }
    }
}
