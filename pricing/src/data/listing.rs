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

/// One row of the listings CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: i64,
    pub name: String,
    pub host_id: i64,
    pub host_name: String,
    pub neighbourhood_group: String,
    pub neighbourhood: String,
    pub latitude: f64,
    pub longitude: f64,
    pub room_type: String,
    pub price: f64,
    pub minimum_nights: u32,
    pub number_of_reviews: u32,
    pub last_review: Option<String>,
    pub reviews_per_month: Option<f64>,
    pub calculated_host_listings_count: u32,
    pub availability_365: u32,
}

/// Column names of the raw dataset, in file order.
pub const RAW_COLUMNS: [&str; 16] = [
    "id",
    "name",
    "host_id",
    "host_name",
    "neighbourhood_group",
    "neighbourhood",
    "latitude",
    "longitude",
    "room_type",
    "price",
    "minimum_nights",
    "number_of_reviews",
    "last_review",
    "reviews_per_month",
    "calculated_host_listings_count",
    "availability_365",
];

/// The loaded listings, in file order.
///
/// The table is read-only once loaded; every consumer clones it before deriving anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    listings: Vec<Listing>,
}

impl RawTable {
    pub fn new(listings: Vec<Listing>) -> Self {
        RawTable { listings }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Shape as `(rows, columns)` of the raw CSV.
    pub fn shape(&self) -> (usize, usize) {
        (self.listings.len(), RAW_COLUMNS.len())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Listing> {
        self.listings.iter()
    }
}

impl From<Vec<Listing>> for RawTable {
    fn from(listings: Vec<Listing>) -> Self {
        RawTable::new(listings)
    }
}

impl<'a> IntoIterator for &'a RawTable {
    type Item = &'a Listing;
    type IntoIter = std::slice::Iter<'a, Listing>;

    fn into_iter(self) -> Self::IntoIter {
        self.listings.iter()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Listing;

    /// Builds a listing with plausible defaults; tests override what they care about.
    pub fn listing(
        neighbourhood_group: &str,
        neighbourhood: &str,
        room_type: &str,
        price: f64,
    ) -> Listing {
        Listing {
            id: 1,
            name: "Cozy place".to_string(),
            host_id: 10,
            host_name: "Host".to_string(),
            neighbourhood_group: neighbourhood_group.to_string(),
            neighbourhood: neighbourhood.to_string(),
            latitude: 40.7,
            longitude: -73.9,
            room_type: room_type.to_string(),
            price,
            minimum_nights: 2,
            number_of_reviews: 5,
            last_review: Some("2019-06-01".to_string()),
            reviews_per_month: Some(1.0),
            calculated_host_listings_count: 1,
            availability_365: 100,
        }
    }

    /// A small synthetic dataset spread over every borough and room type, with
    /// prices that depend on location and room type.
    pub fn synthetic(n: usize) -> Vec<Listing> {
        let groups = ["Bronx", "Brooklyn", "Manhattan", "Queens", "Staten Island"];
        let rooms = ["Entire home/apt", "Private room", "Shared room"];
        (0..n)
            .map(|i| {
                let group = groups[i % groups.len()];
                let room = rooms[(i / 2) % rooms.len()];
                let hood = format!("{}-{}", group, i % 3);
                let base = match room {
                    "Entire home/apt" => 180.0,
                    "Private room" => 90.0,
                    _ => 50.0,
                };
                let price = base + (i % groups.len()) as f64 * 15.0 + (i % 7) as f64;
                let mut listing = listing(group, &hood, room, price);
                listing.id = i as i64;
                listing.latitude = 40.5 + (i % 11) as f64 * 0.03;
                listing.longitude = -74.1 + (i % 13) as f64 * 0.02;
                listing.minimum_nights = 1 + (i % 5) as u32;
                listing.number_of_reviews = (i % 17) as u32;
                listing.reviews_per_month =
                    if i % 6 == 0 { None } else { Some(0.1 + (i % 9) as f64 * 0.35) };
                listing.availability_365 = (i * 37 % 366) as u32;
                listing
            })
            .collect()
    }
}
