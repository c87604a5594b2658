use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use htsbus_servo::{Advisory, MotorMode, ServoStatus};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    schema_id: &'a str,
    port: &'a str,
    #[serde(flatten)]
    status: &'a ServoStatus,
}

/// Acknowledgement of a command that changes servo state.
#[derive(Debug, Serialize)]
pub struct ActionOutput {
    pub action: &'static str,
    pub id: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<Advisory>,
}

pub fn print_status(status: &ServoStatus, port: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = StatusOutput {
                schema_id: "https://schemas.3leaps.dev/htsbus/cli/v1/servo-status.schema.json",
                port,
                status,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in status_rows(status) {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Servo {} on {port}:", status.id);
            for (field, value) in status_rows(status) {
                println!("  {:<14} {value}", format!("{field}:"));
            }
        }
    }
}

pub fn print_action(out: &ActionOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ACTION", "SERVO", "DETAIL"])
                .add_row(vec![out.action, out.id.as_str(), out.detail.as_str()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{} servo={} {}", out.action, out.id, out.detail);
        }
    }
    if let Some(advisory) = &out.advisory {
        if format != OutputFormat::Json {
            eprintln!("note: {advisory}");
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn status_rows(status: &ServoStatus) -> Vec<(&'static str, String)> {
    let mode = match status.motor_mode {
        MotorMode::Servo => "servo".to_string(),
        MotorMode::Motor { speed } => format!("motor (speed {speed})"),
    };
    let faults = [
        (status.led_error.over_temperature, "temperature"),
        (status.led_error.over_voltage, "voltage"),
        (status.led_error.stalled, "stall"),
    ]
    .iter()
    .filter(|(enabled, _)| *enabled)
    .map(|(_, name)| *name)
    .collect::<Vec<_>>();

    vec![
        ("Position", format!("{} ({:.1}°)", status.position, status.degree)),
        ("Temperature", format!("{} °C", status.temperature_c)),
        ("Voltage", format!("{} mV", status.voltage_mv)),
        ("Angle offset", status.angle_offset.to_string()),
        ("Mode", mode),
        ("Torque", if status.loaded { "on" } else { "off" }.to_string()),
        ("LED", if status.led_on { "on" } else { "off" }.to_string()),
        (
            "LED alarms",
            if faults.is_empty() {
                "none".to_string()
            } else {
                faults.join(", ")
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use htsbus_servo::LedErrorFlags;

    use super::*;

    fn sample() -> ServoStatus {
        ServoStatus {
            id: 3,
            position: 500,
            degree: 120.0,
            temperature_c: 40,
            voltage_mv: 11800,
            angle_offset: -4,
            loaded: true,
            led_on: false,
            motor_mode: MotorMode::Motor { speed: -300 },
            led_error: LedErrorFlags {
                over_temperature: true,
                over_voltage: false,
                stalled: true,
            },
        }
    }

    #[test]
    fn status_rows_render_units() {
        let rows = status_rows(&sample());
        assert!(rows.contains(&("Position", "500 (120.0°)".to_string())));
        assert!(rows.contains(&("Mode", "motor (speed -300)".to_string())));
        assert!(rows.contains(&("LED alarms", "temperature, stall".to_string())));
    }

    #[test]
    fn status_json_is_flat() {
        let status = sample();
        let out = StatusOutput {
            schema_id: "x",
            port: "/dev/ttyUSB0",
            status: &status,
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["port"], "/dev/ttyUSB0");
        assert_eq!(json["motor_mode"]["speed"], -300);
    }

    #[test]
    fn action_omits_missing_advisory() {
        let out = ActionOutput {
            action: "stop",
            id: "broadcast".to_string(),
            detail: String::new(),
            advisory: None,
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(!json.contains("advisory"));
    }
}
