//! Fixed system instruction and tool declarations sent with every request.

use serde::Serialize;
use serde_json::{json, Value};

use crate::kernel::commands::{
    CONTROL_FANS, CONTROL_FERTILIZER_LINE, CONTROL_LIGHTS, CONTROL_MISTERS, CONTROL_PUMP, LOAD_AI_MODEL,
    TOGGLE_PERMACULTURE_MODE, TOGGLE_SENTRY_CAMERA,
};

pub const SYSTEM_INSTRUCTION: &str = r#"You are the Lead Systems Architect for "AgriPulse," an advanced edge-computing agricultural solution. Your expertise is configured for a specific Bill of Materials (BOM). You must provide answers ONLY within the context of this BOM.

**Core Hardware Configuration:**
- **Compute Nodes:** 3x Raspberry Pi 5 (16GB model).
- **AI Accelerator:** 1x Raspberry Pi AI HAT+ 2 with a Hailo-10H (40 TOPS) NPU, on the Sentry node.
- **Primary Storage:** 1x 512GB NVMe SSD (PCIe Gen 3) on the Master node via an NVMe HAT.
- **Enclosure:** A single IP65 Vented Polycarbonate Enclosure.
- **Thermal Management:** An official Active Cooler on each Raspberry Pi 5.

**Master Node Actuators:** Water Pump, Mister System, LED Grow Lights, Ventilation Fans, and three fertilizer lines (N, P, K).

**Sensor & Periphery Configuration:**
- **Vision:** The Sentry node uses a 120FPS Global Shutter Camera.
- **Environmental:** The Telemetry node uses a Raspberry Pi Sense HAT for temperature, humidity and pressure.
- **Analog Sensors:** 3x Capacitive Soil Moisture, 1x Industrial Soil pH Probe and 1x Ammonia/DAP Sensor through an ADS1115 16-bit 4-Channel I2C ADC, plus 2x DS18B20 Waterproof Temperature Probes.

**Software & Network Architecture:**
- **Network Boot:** PiNet (LTSP) diskless boot of the Sentry and Telemetry nodes from the Master node.
- **Storage Architecture:** The Master node NVMe hosts the shared PiNet OS images, logs and Minima blockchain data.
- **Blockchain:** Minima CLI/RPC is used for data integrity.

**Your Task:**
Give comprehensive, practical, expert-level answers that reflect the EXACT hardware and software stack above:
1. Reference specific BOM components when discussing code or procedures.
2. Provide PiNet-aware Python scripts whose file I/O uses shared paths on the Master node NVMe (e.g. `/srv/pinet/`).
3. Explain AI inference loops that offload processing to the Hailo-10H NPU.
4. State which commands run on the PiNet server versus the client `ltsp-chroot` environment.
5. Propose failover mechanisms within the 3-node cluster.
6. Enclose all code in Markdown blocks.
7. Wrap all hardware communication in robust `try...except` blocks.
8. Stay edge-first: never rely on cloud services.

You also interpret Ammonia (NH3) readings as an indicator of Diammonium Phosphate (DAP) levels, and advise on enabling or disabling "Permaculture Enforcement Mode" (companion planting, biodiversity focus).

When the user asks to operate the hardware, call the matching tool. Your initial greeting has already been sent; do not repeat it."#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

fn switch_param(description: &str) -> Value {
    json!({ "type": "STRING", "description": description, "enum": ["on", "off"] })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "OBJECT", "properties": properties, "required": required })
}

/// The eight actuator tools, in declaration order.
pub fn tool_schemas() -> Vec<ToolSchema> {
    let state = "The desired state, either 'on' or 'off'.";
    vec![
        ToolSchema {
            name: TOGGLE_SENTRY_CAMERA,
            description: "Starts or stops the camera feed on the Sentry node.",
            parameters: object(
                json!({ "state": switch_param("The desired state of the camera, either 'on' or 'off'.") }),
                &["state"],
            ),
        },
        ToolSchema {
            name: LOAD_AI_MODEL,
            description: "Loads a specified AI model onto the Sentry node NPU.",
            parameters: object(
                json!({ "model_name": { "type": "STRING", "description": "The name of the AI model to load, e.g., 'YOLOv8' or 'ResNet50'." } }),
                &["model_name"],
            ),
        },
        ToolSchema {
            name: CONTROL_PUMP,
            description: "Controls the main water pump for irrigation.",
            parameters: object(
                json!({
                    "state": switch_param(state),
                    "duration_minutes": { "type": "NUMBER", "description": "Optional duration in minutes for how long the pump should run before automatically turning off." }
                }),
                &["state"],
            ),
        },
        ToolSchema {
            name: CONTROL_MISTERS,
            description: "Controls the mister/fogger system to manage humidity or apply foliar treatments.",
            parameters: object(
                json!({
                    "state": switch_param(state),
                    "duration_minutes": { "type": "NUMBER", "description": "Optional duration in minutes for how long the misters should run." }
                }),
                &["state"],
            ),
        },
        ToolSchema {
            name: CONTROL_FERTILIZER_LINE,
            description: "Activates a specific fertilizer line to dispense nutrients.",
            parameters: object(
                json!({
                    "nutrient": { "type": "STRING", "description": "The nutrient line to activate.", "enum": ["N", "P", "K"] },
                    "amount_ml": { "type": "NUMBER", "description": "The amount in milliliters (ml) to dispense." }
                }),
                &["nutrient", "amount_ml"],
            ),
        },
        ToolSchema {
            name: TOGGLE_PERMACULTURE_MODE,
            description: "Enables or disables the Permaculture Enforcement mode on the telemetry node.",
            parameters: object(
                json!({ "state": { "type": "BOOLEAN", "description": "The desired state, 'true' to enable or 'false' to disable." } }),
                &["state"],
            ),
        },
        ToolSchema {
            name: CONTROL_LIGHTS,
            description: "Controls the main LED grow lights.",
            parameters: object(json!({ "state": switch_param(state) }), &["state"]),
        },
        ToolSchema {
            name: CONTROL_FANS,
            description: "Controls the ventilation fans for air circulation.",
            parameters: object(json!({ "state": switch_param(state) }), &["state"]),
        },
    ]
}
