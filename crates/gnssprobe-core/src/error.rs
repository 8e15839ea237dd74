use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("open {port} failed: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("no serial port wired to rx={rx} tx={tx}")]
    UnroutedPins { rx: u8, tx: u8 },

    #[error("serial line error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("transport closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
