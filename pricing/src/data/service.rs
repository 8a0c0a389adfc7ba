// BSD 3-Clause License
//
// Copyright (c) 2025, BlackPortal ○
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};
use reqwest::blocking::get;

use super::csv::ListingCsvLoader;
use super::error::DataLoadError;
use super::listing::RawTable;
use super::load_data;

/// Where the listings CSV comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// A CSV file on disk.
    Path(PathBuf),
    /// A CSV file downloaded over HTTP(S).
    Url(String),
    /// CSV text supplied directly, e.g. from a file upload.
    InMemory(String),
}

impl DataSource {
    pub fn path<P: Into<PathBuf>>(path: P) -> Self {
        DataSource::Path(path.into())
    }

    pub fn url(url: &str) -> Self {
        DataSource::Url(url.to_string())
    }

    pub fn in_memory<S: Into<String>>(csv: S) -> Self {
        DataSource::InMemory(csv.into())
    }

    fn read(&self) -> Result<RawTable, DataLoadError> {
        match self {
            DataSource::Path(path) => load_data::<ListingCsvLoader, _>(path),
            DataSource::Url(url) => {
                debug!("Downloading listings from {}", url);
                let response = get(url)?.error_for_status()?;
                let text = response.text()?;
                RawTable::from_reader(text.as_bytes())
            }
            DataSource::InMemory(csv) => RawTable::from_reader(csv.as_bytes()),
        }
    }
}

/// Loads the raw listings once and hands out independent copies.
///
/// The cached table is never mutated. It is re-read only when [`reload`](Self::reload) is
/// called or the source is replaced; a failed load leaves the cache empty so the next
/// call tries again.
#[derive(Debug)]
pub struct DatasetService {
    source: DataSource,
    cached: Option<Arc<RawTable>>,
}

impl DatasetService {
    pub fn new(source: DataSource) -> Self {
        DatasetService { source, cached: None }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }

    /// Returns a copy of the cached table, loading it first if needed.
    pub fn table(&mut self) -> Result<RawTable, DataLoadError> {
        Ok(self.shared()?.as_ref().clone())
    }

    /// Returns the cached table without copying it.
    pub fn shared(&mut self) -> Result<Arc<RawTable>, DataLoadError> {
        if let Some(table) = &self.cached {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(self.source.read()?);
        info!("Cached {} listings", table.len());
        self.cached = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Re-reads the source, replacing the cached table.
    pub fn reload(&mut self) -> Result<(), DataLoadError> {
        self.invalidate();
        self.shared().map(|_| ())
    }

    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            debug!("Dropped cached listings");
        }
    }

    /// Swaps the data source, e.g. after a user uploads a file.
    pub fn replace_source(&mut self, source: DataSource) {
        self.source = source;
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CSV: &str = "id,name,host_id,host_name,neighbourhood_group,neighbourhood,latitude,longitude,room_type,price,minimum_nights,number_of_reviews,last_review,reviews_per_month,calculated_host_listings_count,availability_365\n\
        1,Room,2,Ann,Queens,Astoria,40.76,-73.92,Shared room,80,2,4,2019-01-01,0.5,1,20\n";

    #[test]
    fn test_in_memory_source() {
        let mut service = DatasetService::new(DataSource::in_memory(CSV));
        assert!(!service.is_loaded());
        let table = service.table().expect("Failed to load table");
        assert_eq!(table.len(), 1);
        assert!(service.is_loaded());
    }

    #[test]
    fn test_cache_survives_file_changes_until_reload() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(CSV.as_bytes()).expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");

        let mut service = DatasetService::new(DataSource::path(file.path()));
        assert_eq!(service.table().unwrap().len(), 1);

        writeln!(file, "2,Flat,3,Bob,Bronx,Mott Haven,40.81,-73.92,Private room,60,1,0,,,1,0")
            .expect("Failed to append row");
        file.flush().expect("Failed to flush temp file");

        assert_eq!(service.table().unwrap().len(), 1);
        service.reload().expect("Reload failed");
        assert_eq!(service.table().unwrap().len(), 2);
    }

    #[test]
    fn test_copies_are_independent() {
        let mut service = DatasetService::new(DataSource::in_memory(CSV));
        let mut copy = service.table().unwrap();
        let listings = vec![copy.listings()[0].clone(), copy.listings()[0].clone()];
        copy = RawTable::new(listings);
        assert_eq!(copy.len(), 2);
        assert_eq!(service.table().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_reported_and_not_cached() {
        let mut service = DatasetService::new(DataSource::path("does/not/exist.csv"));
        assert!(matches!(service.table(), Err(DataLoadError::FileOpen(_))));
        assert!(!service.is_loaded());

        service.replace_source(DataSource::in_memory(CSV));
        assert_eq!(service.table().unwrap().len(), 1);
    }
}
