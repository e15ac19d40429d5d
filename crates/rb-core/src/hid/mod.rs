//! HID output: report layouts, the encoder, and the report descriptor.

pub mod descriptor;
pub mod report;

pub use descriptor::HID_REPORT_DESCRIPTOR;
pub use report::{decode_mouse_report, encode_intent, modifiers, HidReport, ReportId};
