//! Durable storage of the single access credential.
//!
//! The record is a small JSON document:
//!
//! ```json
//! { "accessToken": "BQD..." }
//! ```
//!
//! `accessToken` is `null` until the first authorization. Writes go to a
//! sibling temporary file that is then renamed over the record, so readers
//! never observe a partially written record.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    token::Credential,
};

/// On-disk layout of the credential record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    access_token: Option<String>,
}

/// File-backed store for the access credential.
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Records larger than this are not credential records.
    const MAX_RECORD_SIZE: u64 = 64 * 1024;

    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored credential.
    ///
    /// Never fails: a missing record is created empty, and an unreadable or
    /// corrupt record is logged and treated as absent so that the user is
    /// asked to reauthorize instead of the process crashing.
    #[must_use]
    pub fn load(&self) -> Option<Credential> {
        match self.try_load() {
            Ok(Some(credential)) => {
                info!("token loaded from {}: {credential:?}", self.path.display());
                Some(credential)
            }
            Ok(None) => {
                info!("no token found; please authorize");
                None
            }
            Err(e) if is_not_found(&e) => {
                warn!("token file {} not found", self.path.display());
                match self.write(&Record::default()) {
                    Ok(()) => info!("token file created"),
                    Err(e) => error!("error creating token file: {e}"),
                }
                info!("please authorize");
                None
            }
            Err(e) => {
                error!("error reading token file {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Reads the record, distinguishing absent from unreadable.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the record does not exist, is too large, is not
    /// valid JSON, or holds a malformed token.
    pub fn try_load(&self) -> Result<Option<Credential>> {
        let file_size = fs::metadata(&self.path)?.len();
        if file_size > Self::MAX_RECORD_SIZE {
            return Err(Error::storage(format!(
                "{} is too large",
                self.path.display()
            )));
        }

        let contents = fs::read_to_string(&self.path)?;
        let record = serde_json::from_str::<Record>(&contents).map_err(|e| {
            Error::storage(format!("{} format is invalid: {e}", self.path.display()))
        })?;

        record
            .access_token
            .map(Credential::new)
            .transpose()
            .map_err(|e| Error::storage(e.error))
    }

    /// Overwrites the record with a new credential.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on any I/O failure. The previous record is left
    /// intact in that case.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let record = Record {
            access_token: Some(credential.as_str().to_owned()),
        };
        self.write(&record)?;
        debug!("token saved to {}", self.path.display());

        Ok(())
    }

    fn write(&self, record: &Record) -> Result<()> {
        let json = serde_json::to_vec(record).map_err(Error::storage)?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| Error::storage(format!("{} is not a file", self.path.display())))?;
        let mut tmp_name = file_name.to_owned();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let result =
            Self::write_new(&tmp_path, &json).and_then(|()| fs::rename(&tmp_path, &self.path));
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }

        result.map_err(Into::into)
    }

    fn write_new(path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        // The record grants access to the user's account.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path)?;
        file.write_all(contents)?;
        file.sync_all()
    }
}

fn is_not_found(e: &Error) -> bool {
    e.downcast::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}
