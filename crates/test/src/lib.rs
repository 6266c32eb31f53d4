//! Test helpers and fixtures.

use shelfdeck_core::{Library, Series, Settings, Theme, Volume};

pub fn make_settings(grid_columns: usize) -> Settings {
    Settings {
        backend_url: "http://127.0.0.1:11337".to_string(),
        grid_columns,
        status_poll_secs: 5,
        volumes_poll_secs: 1,
        page_timeout_secs: 12,
        theme: Theme::Dark,
    }
}

pub fn sample_libraries() -> Vec<Library> {
    ["Manga", "Comics", "Light novels"]
        .into_iter()
        .zip(1..)
        .map(|(title, id)| Library {
            id,
            title: title.to_string(),
        })
        .collect()
}

/// Mixed progress, in server order: finished, unstarted, half read, finished, cached.
pub fn sample_series() -> Vec<Series> {
    [
        (10, "Berserk", 100.0, false),
        (11, "Vagabond", 0.0, false),
        (12, "Blame!", 48.5, true),
        (13, "Pluto", 100.0, true),
        (14, "Monster", 12.0, true),
    ]
    .into_iter()
    .map(|(id, title, read_percent, cached)| Series {
        id,
        title: title.to_string(),
        read_percent,
        cached,
    })
    .collect()
}

/// Volumes of one series; `read[i]` pages read out of 20 for volume `i + 1`.
pub fn sample_volumes(series_id: u64, read: &[u32]) -> Vec<Volume> {
    read.iter()
        .zip(1u64..)
        .map(|(&read, number)| Volume {
            series_id,
            volume_id: series_id * 100 + number,
            chapter_id: series_id * 1000 + number,
            title: format!("Vol. {number}"),
            pages: 20,
            read,
            cached: number % 2 == 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use shelfdeck_application::{AppContext, FocusFallback, GridScreen, ResumeUpdate, Tile};
    use shelfdeck_core::{ResumeKey, order_series};
    use shelfdeck_storage::Storage;

    use super::*;

    #[test]
    fn builds_settings() {
        let mut settings = make_settings(40);
        settings.normalize();
        assert_eq!(settings.grid_columns, 12);
    }

    #[test]
    fn completed_series_sink_to_the_end() {
        let ordered = order_series(sample_series());
        let ids = ordered.iter().map(|s| s.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![11, 12, 14, 10, 13]);
    }

    #[test]
    fn volumes_open_on_first_unfinished() {
        let now = Instant::now();
        let mut grid = GridScreen::new(
            4,
            Some(ResumeKey::Series(10)),
            None,
            FocusFallback::FirstIncomplete,
        );
        grid.replace_items(sample_volumes(10, &[20, 20, 7, 0]), now);
        assert_eq!(grid.focused_item().map(Tile::title), Some("Vol. 3"));

        let mut all_read = GridScreen::new(4, None, None, FocusFallback::FirstIncomplete);
        all_read.replace_items(sample_volumes(10, &[20, 20]), now);
        assert_eq!(all_read.focused_index(), Some(1));
    }

    #[test]
    fn resume_points_survive_a_restart() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("shelfdeck-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let db = dir.join("resume.db");
        let _ = std::fs::remove_file(&db);

        let mut ctx = AppContext::new(make_settings(8));
        let series = sample_series();
        let picked = &series[2];
        ctx.record_resume(&ResumeUpdate {
            key: ResumeKey::Library(1),
            item_id: picked.id(),
        });
        {
            let storage = Storage::open(&db)?;
            for (key, item_id) in ctx.take_dirty_resume_points() {
                storage.set_resume_point(key, &item_id)?;
            }
        }

        let storage = Storage::open(&db)?;
        let restored = AppContext::new(make_settings(8))
            .with_resume_points(storage.list_resume_points()?);
        let now = Instant::now();
        let mut grid = GridScreen::new(
            8,
            Some(ResumeKey::Library(1)),
            restored.resume_point(ResumeKey::Library(1)),
            FocusFallback::First,
        );
        grid.replace_items(order_series(series), now);
        assert_eq!(grid.focused_item().map(|s| s.id), Some(12));

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
