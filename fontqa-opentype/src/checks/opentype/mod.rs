#[allow(non_snake_case)]
pub mod STAT;
pub mod fvar;
pub mod varfont;
