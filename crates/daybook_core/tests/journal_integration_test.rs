//! Integration tests for the on-disk journal layout

#[cfg(test)]
mod journal_integration_tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::NaiveDate;
    use daybook_core::{
        AutosaveState, Config, ConfigStore, FileSource, Journal, MonthKey, NativeTree, RootHandle,
    };

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn journal_at(root: &Path, debounce: Duration) -> Journal<NativeTree> {
        let settings = Arc::new(ConfigStore::in_memory(Config::new(RootHandle::new(
            root.display().to_string(),
        ))));
        Journal::with_debounce(NativeTree, settings, debounce)
    }

    #[tokio::test]
    async fn saved_entries_follow_the_month_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let journal = journal_at(tmp.path(), Duration::from_secs(60));

        journal.load_date(date(2026, 1, 16)).await;
        journal.on_text_changed("first entry\n");
        let view = journal.save_now().await;

        assert!(view.error.is_none());
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("2026-01").join("2026-01-16.md")).unwrap(),
            "first entry\n"
        );
        assert!(!tmp.path().join("2026-01").join("attachments").exists());
    }

    #[tokio::test]
    async fn attachments_land_in_the_month_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let photo = outside.path().join("cat.png");
        std::fs::write(&photo, b"\x89PNG").unwrap();
        let journal = journal_at(tmp.path(), Duration::from_secs(60));

        journal.load_date(date(2026, 1, 16)).await;
        let view = journal.attach_files(&[FileSource::new(&photo)]).await;
        journal.save_now().await;

        assert_eq!(view.attached.len(), 1);
        let name = &view.attached[0].name;
        assert!(name.ends_with("_cat.png"));
        let stored = tmp.path().join("2026-01").join("attachments").join(name);
        assert_eq!(std::fs::read(&stored).unwrap(), b"\x89PNG");

        let entry =
            std::fs::read_to_string(tmp.path().join("2026-01").join("2026-01-16.md")).unwrap();
        assert_eq!(entry, format!("![{name}](attachments/{name})\n"));
        assert!(view.preview.contains("file://"));
        assert!(!entry.contains("file://"));
    }

    #[tokio::test]
    async fn debounced_edit_is_written_once_typing_stops() {
        let tmp = tempfile::tempdir().unwrap();
        let journal = journal_at(tmp.path(), Duration::from_millis(20));
        journal.load_date(date(2026, 3, 1)).await;
        let mut revisions = journal.subscribe();
        revisions.mark_unchanged();

        journal.on_text_changed("typed");
        tokio::time::timeout(Duration::from_secs(5), async {
            while journal.view().state != AutosaveState::Idle {
                revisions.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(tmp.path().join("2026-03").join("2026-03-01.md")).unwrap(),
            "typed"
        );
    }

    #[tokio::test]
    async fn month_listing_ignores_stray_files() {
        let tmp = tempfile::tempdir().unwrap();
        let month_dir = tmp.path().join("2026-01");
        std::fs::create_dir_all(&month_dir).unwrap();
        std::fs::write(month_dir.join("2026-01-16.md"), "a").unwrap();
        std::fs::write(month_dir.join("README.txt"), "b").unwrap();
        std::fs::write(month_dir.join("2026-01-31.md"), "c").unwrap();
        let journal = journal_at(tmp.path(), Duration::from_secs(60));

        let view = journal
            .load_month(MonthKey::new(2026, 1).unwrap())
            .await;

        assert_eq!(
            view.entry_dates.into_iter().collect::<Vec<_>>(),
            vec![date(2026, 1, 16), date(2026, 1, 31)]
        );
    }

    #[tokio::test]
    async fn missing_root_folder_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let journal = journal_at(&tmp.path().join("does-not-exist"), Duration::from_secs(60));

        let view = journal.load_date(date(2026, 1, 16)).await;

        assert_eq!(view.error.map(|e| e.kind).as_deref(), Some("RootInvalid"));
        assert_eq!(journal.current_root().await, None);
    }
}
