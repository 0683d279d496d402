//! Id, hash and isohash command implementations.

use crate::cli::{FileArgs, HashArgs};
use crate::error::Result;
use crate::output::Formatter;
use gbd_extract::hash;

/// Execute the id command.
pub fn execute_id(args: FileArgs, formatter: &Formatter) -> Result<()> {
    let hash = hash::identify(&args.file)?;
    println!("{}", formatter.hash(&args.file, &hash)?);
    Ok(())
}

/// Execute the hash command.
pub fn execute_hash(args: HashArgs, formatter: &Formatter) -> Result<()> {
    let hash = hash::gbdhash(&args.file, args.kind.into())?;
    println!("{}", formatter.hash(&args.file, &hash)?);
    Ok(())
}

/// Execute the isohash command.
pub fn execute_isohash(args: FileArgs, formatter: &Formatter) -> Result<()> {
    let hash = hash::isohash(&args.file)?;
    println!("{}", formatter.hash(&args.file, &hash)?);
    Ok(())
}
