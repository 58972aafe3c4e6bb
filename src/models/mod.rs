pub mod admin;
pub mod contact;
pub mod feedback;
pub mod page_view;
pub mod project;
pub mod settings;
pub mod site_stats;
pub mod visitor;
