use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 512;
pub const MAX_VALUE_LENGTH: usize = 64 * 1024;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum StorageError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value too large: {len} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { len: usize, max: usize },

    #[error("storage error: {message}")]
    Io { message: String },
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key cannot be empty".to_string(),
        });
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StorageError::InvalidKey {
            key: key.chars().take(50).collect::<String>() + "...",
            reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
        });
    }
    if key.chars().any(char::is_control) {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key contains control characters".to_string(),
        });
    }
    Ok(())
}

/// Durable single-key storage, backed by whatever the shell has
/// (browser local storage, a keychain entry, a file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageOperation {
    Read { key: String },
    Write { key: String, value: String },
    Remove { key: String },
}

impl StorageOperation {
    pub fn read(key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self::Read { key })
    }

    pub fn write(key: impl Into<String>, value: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        let value = value.into();
        validate_key(&key)?;
        if value.len() > MAX_VALUE_LENGTH {
            return Err(StorageError::ValueTooLarge {
                len: value.len(),
                max: MAX_VALUE_LENGTH,
            });
        }
        Ok(Self::Write { key, value })
    }

    pub fn remove(key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self::Remove { key })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageOutput {
    Value(Option<String>),
    Done,
}

pub type StorageResult = Result<StorageOutput, StorageError>;

impl Operation for StorageOperation {
    type Output = StorageResult;
}

pub struct Storage<Ev> {
    context: CapabilityContext<StorageOperation, Ev>,
}

impl<Ev> Capability<Ev> for Storage<Ev> {
    type Operation = StorageOperation;
    type MappedSelf<MappedEv> = Storage<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Storage::new(self.context.map_event(f))
    }
}

impl<Ev> Storage<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<StorageOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn read<F>(&self, key: impl Into<String>, make_event: F)
    where
        F: FnOnce(Result<Option<String>, StorageError>) -> Ev + Send + 'static,
    {
        let operation = match StorageOperation::read(key) {
            Ok(operation) => operation,
            Err(err) => {
                let context = self.context.clone();
                self.context
                    .spawn(async move { context.update_app(make_event(Err(err))) });
                return;
            }
        };

        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            let value = result.map(|output| match output {
                StorageOutput::Value(value) => value,
                StorageOutput::Done => None,
            });
            context.update_app(make_event(value));
        });
    }

    /// Fire-and-forget write; failures are logged, not surfaced.
    pub fn write(&self, key: impl Into<String>, value: impl Into<String>) {
        let operation = match StorageOperation::write(key, value) {
            Ok(operation) => operation,
            Err(err) => {
                tracing::warn!(error = %err, "storage write rejected");
                return;
            }
        };

        let context = self.context.clone();
        self.context.spawn(async move {
            if let Err(err) = context.request_from_shell(operation).await {
                tracing::warn!(error = %err, "storage write failed");
            }
        });
    }

    /// Fire-and-forget removal; failures are logged, not surfaced.
    pub fn remove(&self, key: impl Into<String>) {
        let operation = match StorageOperation::remove(key) {
            Ok(operation) => operation,
            Err(err) => {
                tracing::warn!(error = %err, "storage remove rejected");
                return;
            }
        };

        let context = self.context.clone();
        self.context.spawn(async move {
            if let Err(err) = context.request_from_shell(operation).await {
                tracing::warn!(error = %err, "storage remove failed");
            }
        });
    }
}
