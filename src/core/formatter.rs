use crate::models::{CatalogResource, Collection, DisplayCard, Profile, Track};

/// Artwork edge length used for thumbnails.
pub const THUMBNAIL_SIZE: u32 = 512;

/// Render a millisecond duration as `ss`, `mm:ss` or `h:mm:ss`.
///
/// Zero renders as an empty string. Hours wrap at 24.
pub fn format_duration(millis: u64) -> String {
    if millis == 0 {
        return String::new();
    }

    let seconds = millis / 1000;
    let ss = seconds % 60;
    let mm = (seconds / 60) % 60;
    let hh = (seconds / (60 * 60)) % 24;

    if hh == 0 && mm != 0 {
        format!("{:02}:{:02}", mm, ss)
    } else if hh == 0 {
        format!("{:02}", ss)
    } else {
        format!("{}:{:02}:{:02}", hh, mm, ss)
    }
}

/// Substitute the `{w}` and `{h}` placeholders of an artwork template.
pub fn thumbnail_url(template: &str, width: u32, height: u32) -> String {
    template
        .replace("{w}", &width.to_string())
        .replace("{h}", &height.to_string())
}

/// Build the display card for a catalog resource shared by `shared_by`.
pub fn build_card(resource: &CatalogResource, shared_by: &str) -> DisplayCard {
    match resource {
        CatalogResource::Song(track) => track_card(
            track,
            format!(
                "Listen to {} by {} on Cider",
                track.album_name, track.artist_name
            ),
            shared_by,
        ),
        CatalogResource::Video(track) => track_card(
            track,
            format!("Listen to {} by {} on Cider", track.name, track.artist_name),
            shared_by,
        ),
        CatalogResource::Album(album) => collection_card(album, "", shared_by),
        CatalogResource::Playlist(playlist) => collection_card(playlist, "N/A", shared_by),
        CatalogResource::Artist(artist) => profile_card(
            artist,
            format!("Listen to {} on Cider", artist.name),
            shared_by,
        ),
        CatalogResource::Station(station) => profile_card(
            station,
            format!("Tune into {} on Cider", station.name),
            shared_by,
        ),
    }
}

fn track_card(track: &Track, description: String, shared_by: &str) -> DisplayCard {
    let duration = format_duration(track.duration_ms.unwrap_or(0));
    let footer = footer(
        shared_by,
        &[duration.clone(), track.release_date.clone().unwrap_or_default()],
    );

    DisplayCard {
        title: track.name.clone(),
        url: track.url.clone(),
        thumbnail: thumbnail_url(&track.artwork, THUMBNAIL_SIZE, THUMBNAIL_SIZE),
        duration,
        description,
        footer,
    }
}

fn collection_card(collection: &Collection, missing_owner: &str, shared_by: &str) -> DisplayCard {
    let duration = format_duration(collection.total_duration_ms());
    let owner = collection.owner.as_deref().unwrap_or(missing_owner);
    let details = [
        format!("Songs: {}", collection.track_count()),
        if duration.is_empty() {
            String::new()
        } else {
            format!("Duration: {}", duration)
        },
    ];

    DisplayCard {
        title: collection.name.clone(),
        url: collection.url.clone(),
        thumbnail: thumbnail_url(&collection.artwork, THUMBNAIL_SIZE, THUMBNAIL_SIZE),
        description: format!("Listen to {} by {} on Cider", collection.name, owner),
        footer: footer(shared_by, &details),
        duration,
    }
}

fn profile_card(profile: &Profile, description: String, shared_by: &str) -> DisplayCard {
    DisplayCard {
        title: profile.name.clone(),
        url: profile.url.clone(),
        thumbnail: thumbnail_url(&profile.artwork, THUMBNAIL_SIZE, THUMBNAIL_SIZE),
        duration: String::new(),
        description,
        footer: footer(shared_by, &[]),
    }
}

/// `Shared by {name} | a • b`, dropping empty details.
fn footer(shared_by: &str, details: &[String]) -> String {
    let details: Vec<&str> = details
        .iter()
        .map(|d| d.as_str())
        .filter(|d| !d.is_empty())
        .collect();

    if details.is_empty() {
        format!("Shared by {}", shared_by)
    } else {
        format!("Shared by {} | {}", shared_by, details.join(" • "))
    }
}
