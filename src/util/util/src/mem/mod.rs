pub mod c_enum;
pub mod hash;
