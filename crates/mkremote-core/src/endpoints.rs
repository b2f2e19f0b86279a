//! Bridge endpoint paths
//!
//! Paths are relative to the configured base URL. The defaults match the
//! routes the Machinekit REST bridge registers.

use serde::{Deserialize, Serialize};

/// Every path the client talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Status snapshot (GET)
    pub status: String,
    /// Power and e-stop (POST `{command}`)
    pub set_machine_status: String,
    /// Jog (POST `{axes, speed, increment, command}`)
    pub manual: String,
    /// MDI line (POST `{command}`)
    pub mdi: String,
    /// Home/unhome all axes (POST `{command}`)
    pub home: String,
    /// Program control (POST `{command}`)
    pub program: String,
    /// Spindle speed step (POST `{spindle_speed}`)
    pub spindle_speed: String,
    /// Spindle brake (POST `{spindle_brake}`)
    pub spindle_brake: String,
    /// Spindle direction (POST `{spindle_direction}`)
    pub spindle_direction: String,
    /// Spindle on/off (POST `{spindle_enabled}`)
    pub spindle_enabled: String,
    /// Spindle override ratio (POST `{spindle_override}`)
    pub spindle_override: String,
    /// Feed override (POST `{command}`)
    pub feed_override: String,
    /// Maximum velocity (POST `{command}`)
    pub max_velocity: String,
    /// Tool change acknowledgement (GET)
    pub toolchange: String,
    /// File listing and persisted queue (GET)
    pub files: String,
    /// Replace the persisted queue (POST `{new_queue}`)
    pub update_file_queue: String,
    /// Load a file into the controller (POST `{name}`)
    pub open_file: String,
    /// Multipart upload, field `file`
    pub file_upload: String,
    /// Allow-listed HAL command (POST `{halcmd}`)
    pub halcmd: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            status: "/status".to_string(),
            set_machine_status: "/set_machine_status".to_string(),
            manual: "/manual".to_string(),
            mdi: "/machinekit/position/mdi".to_string(),
            home: "/machinekit/axes/home".to_string(),
            program: "/machinekit/program".to_string(),
            spindle_speed: "/machinekit/spindle/speed".to_string(),
            spindle_brake: "/machinekit/spindle/brake".to_string(),
            spindle_direction: "/machinekit/spindle/direction".to_string(),
            spindle_enabled: "/machinekit/spindle/enabled".to_string(),
            spindle_override: "/machinekit/spindle/override".to_string(),
            feed_override: "/machinekit/feed".to_string(),
            max_velocity: "/machinekit/maxvel".to_string(),
            toolchange: "/machinekit/toolchange".to_string(),
            files: "/server/files".to_string(),
            update_file_queue: "/server/update_file_queue".to_string(),
            open_file: "/machinekit/open_file".to_string(),
            file_upload: "/server/file_upload".to_string(),
            halcmd: "/machinekit/halcmd".to_string(),
        }
    }
}

impl Endpoints {
    /// Iterate `(name, path)` pairs, used by config validation
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("status", self.status.as_str()),
            ("set_machine_status", self.set_machine_status.as_str()),
            ("manual", self.manual.as_str()),
            ("mdi", self.mdi.as_str()),
            ("home", self.home.as_str()),
            ("program", self.program.as_str()),
            ("spindle_speed", self.spindle_speed.as_str()),
            ("spindle_brake", self.spindle_brake.as_str()),
            ("spindle_direction", self.spindle_direction.as_str()),
            ("spindle_enabled", self.spindle_enabled.as_str()),
            ("spindle_override", self.spindle_override.as_str()),
            ("feed_override", self.feed_override.as_str()),
            ("max_velocity", self.max_velocity.as_str()),
            ("toolchange", self.toolchange.as_str()),
            ("files", self.files.as_str()),
            ("update_file_queue", self.update_file_queue.as_str()),
            ("open_file", self.open_file.as_str()),
            ("file_upload", self.file_upload.as_str()),
            ("halcmd", self.halcmd.as_str()),
        ]
        .into_iter()
    }
}
