pub(crate) mod excel_date;
pub(crate) mod reference;
pub(crate) mod xml;
pub(crate) mod zip;
