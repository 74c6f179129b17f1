/// VFB convertor
pub mod vfb;
