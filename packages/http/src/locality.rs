//! Locality answered by the peer daemon's `blockLocations` endpoint.

use mountfs_core::{BlockLocation, ByteRange, LocalitySource, PeerEndpoint, ResolvedFile, Result};

use crate::client::PeerClient;
use crate::error::Error;
use crate::executor::HttpExecutor;

const BLOCK_LOCATIONS: &str = "blockLocations";

/// Asks the peer daemon which hosts hold a byte range of a file.
///
/// The request is `GET /blockLocations?file=<rel>&start=<s>&length=<l>`
/// where `rel` is the canonical path relative to the mount root. The
/// answer is a JSON array of `{offset, length, hosts}` objects; an empty
/// body means no records.
pub struct RemoteLocality<E> {
    client: PeerClient<E>,
}

impl<E: HttpExecutor> RemoteLocality<E> {
    pub fn new(executor: E, peer: &PeerEndpoint) -> Result<Self> {
        Ok(Self {
            client: PeerClient::new(executor, peer)?,
        })
    }

    pub fn client(&self) -> &PeerClient<E> {
        &self.client
    }
}

impl<E: HttpExecutor> LocalitySource for RemoteLocality<E> {
    fn locate(&self, file: &ResolvedFile, range: ByteRange) -> Result<Vec<BlockLocation>> {
        let query = [
            ("file", file.mount_relative.clone()),
            ("start", range.start.to_string()),
            ("length", range.length.to_string()),
        ];
        let response = self.client.get(BLOCK_LOCATIONS, &query)?;

        if response.body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<BlockLocation> = response.json().map_err(|source| Error::Decode {
            url: format!("{}{}", self.client.base(), BLOCK_LOCATIONS),
            source,
        })?;
        Ok(records)
    }
}
