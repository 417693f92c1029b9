pub mod peak_list;
pub mod shifts;
pub mod ucsf;

pub use peak_list::{
    read_peak_list,
    read_peak_list_file,
    write_peak_list,
    write_peak_list_file,
};
pub use shifts::{
    InputFormat,
    read_shift_table,
    read_shift_table_file,
};
pub use ucsf::{
    UcsfAxis,
    UcsfSpectrum,
    read_ucsf,
    read_ucsf_file,
    write_ucsf,
    write_ucsf_file,
};
