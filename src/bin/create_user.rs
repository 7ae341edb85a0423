use std::{error::Error, io, path::Path, process::exit};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;

use ledgerline::{create_user, get_user_by_email, hash_token, initialize_db, update_token_hash};

/// A utility for registering a user, or giving an existing user a new API token.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address of the user.
    #[arg(long)]
    email: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let email = match args.email.parse::<EmailAddress>() {
        Ok(email) => email,
        Err(error) => {
            print_error(format!("Invalid email address: {error}"));
            exit(1);
        }
    };

    let Some(token) = get_new_token() else {
        return Ok(());
    };

    let conn = Connection::open(db_path)?;
    initialize_db(&conn)?;

    let token_hash = hash_token(&token);
    match get_user_by_email(&email, &conn) {
        Ok(user) => {
            update_token_hash(user.id, &token_hash, &conn)?;
            println!("Updated the token for {email}.");
        }
        Err(ledgerline::Error::NotFound) => {
            let user = create_user(&email, &token_hash, &conn)?;
            println!("Created user {} with ID {}.", email, user.id);
        }
        Err(error) => return Err(error.into()),
    }

    Ok(())
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }
}

fn get_new_token() -> Option<String> {
    loop {
        println!();

        let first_token = match rpassword::prompt_password("Enter an API token: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read token from stdin: {error}"));
                return None;
            }
        };

        if first_token.trim().is_empty() {
            print_error("The token must not be empty.");
            continue;
        }

        let second_token = match rpassword::prompt_password("Confirm the token: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read token from stdin: {error}"));
                return None;
            }
        };

        if first_token != second_token {
            print_error("Tokens must match, try again.");
            continue;
        }

        return Some(first_token);
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string())
}
