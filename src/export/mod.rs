//! Pick-and-place program output.
//!
//! A DPV program is plain text: a short key/value header followed by
//! comma-separated tables, each introduced by its own header row and
//! separated by a blank line:
//!
//! | Table | Rows |
//! |-------|------|
//! | `Station` | Every station in catalog order |
//! | `EComponent` | Parts assigned to a station that still exists |
//! | `Panel_Array` | Board repetition on the panel |
//! | `CalibPoint` | Calibration fiducials |
//! | `CalibFator` | Coordinate correction factors |

pub mod dpv;
