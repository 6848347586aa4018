/// Builds the generation prompt for a mood and genre.
///
/// The output is a pure function of its inputs. The requested layout is what
/// [`super::parser::parse_suggestions`] expects.
pub fn build_prompt(mood: &str, genre: &str, song_count: usize, album_count: usize) -> String {
    format!(
        "Recommend exactly {song_count} songs and {album_count} albums in the {genre} genre \
         that match a {mood} mood.\n\
         Answer using exactly this format and nothing else:\n\
         \n\
         SONGS:\n\
         1. Song Name - Artist Name\n\
         2. Song Name - Artist Name\n\
         \n\
         ALBUMS:\n\
         1. Album Name - Artist Name\n\
         2. Album Name - Artist Name\n\
         \n\
         Number every line, separate the title and the artist with \" - \", \
         and do not add any extra text, explanations or commentary.",
        song_count = song_count,
        album_count = album_count,
        genre = genre.trim(),
        mood = mood.trim(),
    )
}
