//! TMDB movie genre codes.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Genre {
    pub id: u32,
    pub name: &'static str,
}

pub const GENRES: [Genre; 19] = [
    Genre { id: 28, name: "Action" },
    Genre { id: 12, name: "Adventure" },
    Genre { id: 16, name: "Animation" },
    Genre { id: 35, name: "Comedy" },
    Genre { id: 80, name: "Crime" },
    Genre { id: 99, name: "Documentary" },
    Genre { id: 18, name: "Drama" },
    Genre { id: 10751, name: "Family" },
    Genre { id: 14, name: "Fantasy" },
    Genre { id: 36, name: "History" },
    Genre { id: 27, name: "Horror" },
    Genre { id: 10402, name: "Music" },
    Genre { id: 9648, name: "Mystery" },
    Genre { id: 10749, name: "Romance" },
    Genre { id: 878, name: "Science Fiction" },
    Genre { id: 10770, name: "TV Movie" },
    Genre { id: 53, name: "Thriller" },
    Genre { id: 10752, name: "War" },
    Genre { id: 37, name: "Western" },
];

pub fn genre_name(id: u32) -> Option<&'static str> {
    GENRES.iter().find(|g| g.id == id).map(|g| g.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_names_by_code() {
        assert_eq!(genre_name(878), Some("Science Fiction"));
        assert_eq!(genre_name(53), Some("Thriller"));
        assert_eq!(genre_name(0), None);
    }

    #[test]
    fn codes_are_unique() {
        let mut ids: Vec<u32> = GENRES.iter().map(|g| g.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), GENRES.len());
    }
}
