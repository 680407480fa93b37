//! The `preparavest profile` command.

use std::path::PathBuf;

use anyhow::Result;

use preparavest_backends::load_config_from;
use preparavest_core::profile::{load_profile, save_profile, UserProfile, UserRole};

pub fn show(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let path = config.profile_path();

    match load_profile(&path)? {
        Some(profile) => {
            println!("Id:    {}", profile.id);
            println!("Name:  {}", profile.name);
            println!("Email: {}", profile.email);
            println!("Role:  {}", profile.role);
        }
        None => println!("No profile set. Run `preparavest profile set`."),
    }
    Ok(())
}

pub fn set(
    config_path: Option<PathBuf>,
    id: u64,
    name: String,
    email: String,
    role: UserRole,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let path = config.profile_path();

    let profile = UserProfile {
        id,
        name,
        email,
        role,
    };
    save_profile(&path, &profile)?;
    println!("Saved profile for {} to {}", profile.name, path.display());
    Ok(())
}
