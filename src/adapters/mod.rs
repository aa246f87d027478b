//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                  | Connects to            |
//! |---------------|-----------------------------|------------------------|
//! | `config_file` | ConfigPort                  | JSON file on disk      |
//! | `console`     | CommandSource, AckPort      | stdin / log            |
//! | `log_sink`    | EventSink, TelemetrySink    | `log` facade           |
//! | `sim_model`   | ThermalModel                | in-process simulation  |
//! | `time`        | Clock                       | system wall clock      |

pub mod config_file;
pub mod console;
pub mod log_sink;
pub mod sim_model;
pub mod time;
