pub mod backup;
pub mod health;
pub mod links;
pub mod redirect;

pub use backup::{
    clean_backups_handler, create_backup_handler, delete_backup_handler,
    download_backup_handler, list_backups_handler, restore_backup_handler,
};
pub use health::health_handler;
pub use links::{
    create_link_handler, delete_link_handler, get_link_handler, list_links_handler,
    update_link_handler,
};
pub use redirect::redirect_handler;
