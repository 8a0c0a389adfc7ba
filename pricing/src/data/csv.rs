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

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};

use super::error::DataLoadError;
use super::listing::{Listing, RAW_COLUMNS, RawTable};
use crate::data::DataLoader;

/// Loads the listings CSV (with a header row) from disk.
pub struct ListingCsvLoader;

impl DataLoader for ListingCsvLoader {
    type Error = DataLoadError;

    fn load<P: AsRef<Path>>(path: P) -> Result<RawTable, Self::Error> {
        let path = path.as_ref();
        info!("Loading listings from {:?}", path);
        let file = File::open(path)?;
        RawTable::from_reader(file)
    }
}

impl RawTable {
    /// Parses listings from any CSV source. Columns are matched by header name, so
    /// their order in the file does not matter and extra columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<RawTable, DataLoadError> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);

        let headers = rdr.headers()?.clone();
        let positions: HashMap<&str, usize> =
            headers.iter().enumerate().map(|(i, name)| (name.trim(), i)).collect();
        let mut index = [0_usize; RAW_COLUMNS.len()];
        for (slot, column) in index.iter_mut().zip(RAW_COLUMNS.iter()) {
            *slot = *positions
                .get(column)
                .ok_or_else(|| DataLoadError::MissingColumn(column.to_string()))?;
        }

        let mut listings = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            let row = i + 1;
            if record.len() != headers.len() {
                return Err(DataLoadError::InconsistentColumns {
                    row,
                    actual: record.len(),
                    expected: headers.len(),
                });
            }
            let field = |col: usize| record.get(index[col]).unwrap_or("").trim();

            listings.push(Listing {
                id: parse_int(RAW_COLUMNS[0], field(0), row)?,
                name: field(1).to_string(),
                host_id: parse_int(RAW_COLUMNS[2], field(2), row)?,
                host_name: field(3).to_string(),
                neighbourhood_group: field(4).to_string(),
                neighbourhood: field(5).to_string(),
                latitude: parse_float(RAW_COLUMNS[6], field(6), row)?,
                longitude: parse_float(RAW_COLUMNS[7], field(7), row)?,
                room_type: field(8).to_string(),
                price: parse_float(RAW_COLUMNS[9], field(9), row)?,
                minimum_nights: parse_int(RAW_COLUMNS[10], field(10), row)?,
                number_of_reviews: parse_int(RAW_COLUMNS[11], field(11), row)?,
                last_review: optional(field(12)).map(str::to_string),
                reviews_per_month: optional(field(13))
                    .map(|value| parse_float(RAW_COLUMNS[13], value, row))
                    .transpose()?,
                calculated_host_listings_count: parse_int(RAW_COLUMNS[14], field(14), row)?,
                availability_365: parse_int(RAW_COLUMNS[15], field(15), row)?,
            });
        }

        if listings.is_empty() {
            return Err(DataLoadError::EmptyFile);
        }
        debug!("Parsed {} listings", listings.len());
        Ok(RawTable::new(listings))
    }
}

fn optional(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

fn parse_float(column: &'static str, value: &str, row: usize) -> Result<f64, DataLoadError> {
    value.parse::<f64>().map_err(|e| DataLoadError::InvalidNumeric {
        column,
        value: value.to_string(),
        row,
        source: e,
    })
}

fn parse_int<T>(column: &'static str, value: &str, row: usize) -> Result<T, DataLoadError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    value.parse::<T>().map_err(|e| DataLoadError::InvalidInteger {
        column,
        value: value.to_string(),
        row,
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load_data;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "id,name,host_id,host_name,neighbourhood_group,neighbourhood,latitude,longitude,room_type,price,minimum_nights,number_of_reviews,last_review,reviews_per_month,calculated_host_listings_count,availability_365\n";

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_load_listings() {
        let csv_content = format!(
            "{}{}{}",
            HEADER,
            "2539,\"Clean & quiet apt, home by the park\",2787,John,Brooklyn,Kensington,40.64749,-73.97237,Private room,149,1,9,2018-10-19,0.21,6,365\n",
            "3647,THE VILLAGE OF HARLEM,4632,Elisabeth,Manhattan,Harlem,40.80902,-73.9419,Private room,150,3,0,,,1,365\n"
        );
        let temp_file = create_temp_csv(&csv_content);

        let table = load_data::<ListingCsvLoader, _>(temp_file.path()).expect("Failed to load CSV");

        assert_eq!(table.len(), 2);
        let first = &table.listings()[0];
        assert_eq!(first.name, "Clean & quiet apt, home by the park");
        assert_eq!(first.neighbourhood_group, "Brooklyn");
        assert_eq!(first.price, 149.0);
        assert_eq!(first.reviews_per_month, Some(0.21));
        assert_eq!(first.last_review.as_deref(), Some("2018-10-19"));

        let second = &table.listings()[1];
        assert_eq!(second.reviews_per_month, None);
        assert_eq!(second.last_review, None);
        assert_eq!(second.number_of_reviews, 0);
    }

    #[test]
    fn test_load_reordered_and_extra_columns() {
        let csv_content = "price,extra,id,name,host_id,host_name,neighbourhood_group,neighbourhood,latitude,longitude,room_type,minimum_nights,number_of_reviews,last_review,reviews_per_month,calculated_host_listings_count,availability_365\n\
            80,x,1,Room,2,Ann,Queens,Astoria,40.76,-73.92,Shared room,2,4,2019-01-01,0.5,1,20\n";
        let table = RawTable::from_reader(csv_content.as_bytes()).expect("Failed to parse CSV");
        assert_eq!(table.listings()[0].price, 80.0);
        assert_eq!(table.listings()[0].neighbourhood, "Astoria");
    }

    #[test]
    fn test_load_empty_file() {
        let temp_file = create_temp_csv(HEADER);
        let result = load_data::<ListingCsvLoader, _>(temp_file.path());
        assert!(matches!(result, Err(DataLoadError::EmptyFile)));
    }

    #[test]
    fn test_load_missing_column() {
        let csv_content = "id,name\n1,Room\n";
        let result = RawTable::from_reader(csv_content.as_bytes());
        assert!(matches!(result, Err(DataLoadError::MissingColumn(column)) if column == "host_id"));
    }

    #[test]
    fn test_load_invalid_price() {
        let csv_content = format!(
            "{}1,Room,2,Ann,Queens,Astoria,40.76,-73.92,Shared room,cheap,2,4,,,1,20\n",
            HEADER
        );
        let result = RawTable::from_reader(csv_content.as_bytes());
        assert!(matches!(
            result,
            Err(DataLoadError::InvalidNumeric { column: "price", row: 1, value, .. }) if value == "cheap"
        ));
    }

    #[test]
    fn test_load_invalid_integer() {
        let csv_content = format!(
            "{}1,Room,2,Ann,Queens,Astoria,40.76,-73.92,Shared room,80,-2,4,,,1,20\n",
            HEADER
        );
        let result = RawTable::from_reader(csv_content.as_bytes());
        assert!(matches!(
            result,
            Err(DataLoadError::InvalidInteger { column: "minimum_nights", row: 1, .. })
        ));
    }

    #[test]
    fn test_load_inconsistent_columns() {
        let csv_content = format!(
            "{}1,Room,2,Ann,Queens,Astoria,40.76,-73.92,Shared room,80,2,4,,,1\n",
            HEADER
        );
        let result = RawTable::from_reader(csv_content.as_bytes());
        assert!(matches!(
            result,
            Err(DataLoadError::InconsistentColumns { row: 1, actual: 15, expected: 16 })
        ));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_data::<ListingCsvLoader, _>("nonexistent.csv");
        assert!(matches!(result, Err(DataLoadError::FileOpen(_))));
    }
}
