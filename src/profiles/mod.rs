pub mod store;
pub mod types;

pub use store::{
    get_profiles_path, load_profile_file, save_profile_file, JsonProfileStore, ProfileStore,
};
pub use types::{KolProfile, ProfileFile};
