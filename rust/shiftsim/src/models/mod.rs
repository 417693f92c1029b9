mod axis;
mod peak;
mod shift_table;

pub use axis::FrequencyAxis;
pub use peak::Peak;
pub use shift_table::{
    ResidueShifts,
    ShiftEntry,
    ShiftTable,
};
