mod common;
mod form;
mod routing;
mod status;
