//! services/api/src/bin/hash_password.rs
//!
//! Prints the argon2 hash to put in `DASHBOARD_PASSWORD_HASH`. The password is
//! taken from the first argument or, when absent, from the first line of stdin.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use std::io::BufRead;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let password = match std::env::args().nth(1) {
        Some(password) => password,
        None => {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        return Err("password must not be empty".into());
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("failed to hash password: {}", e))?;
    println!("{}", hash);
    Ok(())
}
