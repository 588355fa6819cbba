pub mod form_input;
pub mod status_bar;
pub mod toast;
pub mod tree_view;
