//! カタログセッション
//!
//! アクティブなバージョン・カードストア・オーバーレイをまとめて保持し、
//! UI層から呼ばれるコマンド（追加・編集・削除・検索・ソート・入出力）を提供する。
//!
//! 読み込みは世代番号付きのチケットで管理し、後から開始された読み込みがある場合、
//! 古い読み込みの結果は破棄する。

use crate::catalog::CatalogVersion;
use crate::csv::parse_cards_csv;
use crate::document::parse_catalog_document;
use crate::error::Result;
use crate::loader::{merge_overlay, CatalogSource, VersionedCatalogLoader};
use crate::overlay::{KeyValueStore, OverlayPersistence};
use crate::store::{CardStore, SortColumn, SortSpec};
use crate::types::{Card, CardForm, CatalogSnapshot};
use crate::weight::preview_weight;

/// 読み込み開始時に発行されるチケット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    version: CatalogVersion,
    generation: u64,
}

impl LoadTicket {
    pub fn version(&self) -> CatalogVersion {
        self.version
    }
}

/// 読み込み結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// カードリストに反映した
    Applied {
        version: CatalogVersion,
        cards: usize,
        from_overlay: bool,
    },
    /// より新しい読み込みが開始されていたため破棄した
    Discarded { version: CatalogVersion },
}

/// インポート結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub version: CatalogVersion,
    pub cards: usize,
}

/// ダウンロード用ドキュメント
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub file_name: String,
    pub contents: String,
}

/// アプリケーション全体で1つのカタログ状態
#[derive(Debug)]
pub struct CatalogSession<S> {
    version: CatalogVersion,
    store: CardStore,
    overlay: OverlayPersistence<S>,
    generation: u64,
}

impl<S: KeyValueStore> CatalogSession<S> {
    pub fn new(version: CatalogVersion, overlay: OverlayPersistence<S>) -> Self {
        Self {
            version,
            store: CardStore::new(),
            overlay,
            generation: 0,
        }
    }

    pub fn version(&self) -> CatalogVersion {
        self.version
    }

    pub fn store(&self) -> &CardStore {
        &self.store
    }

    pub fn overlay(&self) -> &OverlayPersistence<S> {
        &self.overlay
    }

    pub fn cards(&self) -> &[Card] {
        self.store.cards()
    }

    // =============================================
    // 読み込み
    // =============================================

    /// 読み込みを開始する
    ///
    /// アクティブバージョンは `finish_load` で結果を反映するまで切り替えない。
    /// 読み込み中の編集は現在のバージョンのオーバーレイに書き込まれる。
    pub fn begin_load(&mut self, version: CatalogVersion) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            version,
            generation: self.generation,
        }
    }

    /// チケットが最新か
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// 取得結果を反映
    ///
    /// バージョンの切り替えとリストの差し替えを同時に行う。
    /// 失敗時はバージョンを切り替えてリストを空にし、エラーを返す。
    /// 古いチケットの結果は何もせず破棄する。
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        fetched: Result<Vec<Card>>,
        apply_overlay: bool,
    ) -> Result<LoadOutcome> {
        if !self.is_current(&ticket) {
            tracing::debug!(version = %ticket.version, "stale catalog load discarded");
            return Ok(LoadOutcome::Discarded {
                version: ticket.version,
            });
        }

        self.version = ticket.version;
        let source = match fetched {
            Ok(cards) => cards,
            Err(e) => {
                tracing::error!(version = %ticket.version, error = %e, "failed to load catalog");
                self.store.clear();
                return Err(e);
            }
        };

        let cached = if apply_overlay {
            self.overlay.load(ticket.version)
        } else {
            None
        };
        let merged = merge_overlay(source, cached);
        self.store.replace_all(merged.cards);

        tracing::info!(
            version = %ticket.version,
            cards = self.store.len(),
            from_overlay = merged.from_overlay,
            "catalog loaded"
        );
        Ok(LoadOutcome::Applied {
            version: ticket.version,
            cards: self.store.len(),
            from_overlay: merged.from_overlay,
        })
    }

    /// バージョンを読み込む（開始→取得→反映）
    pub async fn load_version<Src: CatalogSource>(
        &mut self,
        loader: &VersionedCatalogLoader<Src>,
        version: CatalogVersion,
        apply_overlay: bool,
    ) -> Result<LoadOutcome> {
        let ticket = self.begin_load(version);
        let fetched = loader.fetch_version(version).await;
        self.finish_load(ticket, fetched, apply_overlay)
    }

    /// オーバーレイを削除してソースから再読み込み
    pub async fn reload_from_source<Src: CatalogSource>(
        &mut self,
        loader: &VersionedCatalogLoader<Src>,
    ) -> Result<LoadOutcome> {
        self.clear_cache();
        self.load_version(loader, self.version, false).await
    }

    /// アクティブバージョンのオーバーレイを削除
    pub fn clear_cache(&mut self) -> bool {
        match self.overlay.clear(self.version) {
            Ok(removed) => removed,
            Err(e) => {
                tracing::error!(version = %self.version, error = %e, "failed to clear cache");
                false
            }
        }
    }

    // =============================================
    // 編集コマンド
    // =============================================

    /// カードを追加してオーバーレイに書き込む
    pub fn add_card(&mut self, form: CardForm) -> Result<Card> {
        let card = self.store.add(form)?.clone();
        self.persist();
        Ok(card)
    }

    /// カードを編集してオーバーレイに書き込む
    pub fn edit_card(&mut self, id: i64, form: CardForm) -> Result<Card> {
        let card = self.store.update(id, form)?.clone();
        self.persist();
        Ok(card)
    }

    /// カードを削除。削除した場合のみオーバーレイに書き込む
    pub fn delete_card(&mut self, id: i64) -> bool {
        let removed = self.store.delete(id);
        if removed {
            self.persist();
        }
        removed
    }

    pub fn search(&self, term: &str) -> Vec<&Card> {
        self.store.search(term)
    }

    pub fn sort(&mut self, column: SortColumn) -> SortSpec {
        self.store.sort(column)
    }

    pub fn suggest_next_id(&self) -> i64 {
        self.store.suggest_next_id()
    }

    pub fn preview_weight(&self, gold_cost: f64) -> Option<f64> {
        preview_weight(gold_cost)
    }

    /// 現在のリストをオーバーレイに保存
    ///
    /// 編集コマンドと異なり、保存失敗をエラーとして返す。
    pub fn save_overlay(&mut self) -> Result<()> {
        self.overlay.save(self.version, self.store.cards())
    }

    // 保存失敗はログのみ（メモリ上の状態を正とする）
    fn persist(&mut self) {
        if let Err(e) = self.overlay.save(self.version, self.store.cards()) {
            tracing::error!(version = %self.version, error = %e, "error saving to cache");
        }
    }

    // =============================================
    // 入出力
    // =============================================

    /// `divination_cards_v<version>.json` としてエクスポート
    pub fn export(&self) -> Result<ExportDocument> {
        self.export_as(format!("divination_cards_v{}.json", self.version.id()))
    }

    /// ソースデータセットと同じファイル名でエクスポート
    pub fn export_source_file(&self) -> Result<ExportDocument> {
        self.export_as(self.version.source_file().to_string())
    }

    fn export_as(&self, file_name: String) -> Result<ExportDocument> {
        let snapshot = CatalogSnapshot::new(self.version, self.store.cards().to_vec());
        Ok(ExportDocument {
            file_name,
            contents: snapshot.to_json_pretty()?,
        })
    }

    /// JSONドキュメントをインポート
    ///
    /// `version` があればアクティブバージョンを切り替える。オーバーレイには書き込まない。
    pub fn import_json(&mut self, text: &str) -> Result<ImportOutcome> {
        self.generation += 1;
        let doc = match parse_catalog_document(text) {
            Ok(doc) => doc,
            Err(e) => {
                self.store.clear();
                return Err(e);
            }
        };

        if let Some(version) = doc.version.as_deref() {
            self.version = CatalogVersion::resolve(version);
        }
        self.store.replace_all(doc.cards);

        Ok(ImportOutcome {
            version: self.version,
            cards: self.store.len(),
        })
    }

    /// レガシーCSVをインポート
    pub fn import_csv(&mut self, text: &str) -> Result<ImportOutcome> {
        self.generation += 1;
        match parse_cards_csv(text) {
            Ok(cards) => {
                self.store.replace_all(cards);
                Ok(ImportOutcome {
                    version: self.version,
                    cards: self.store.len(),
                })
            }
            Err(e) => {
                self.store.clear();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::loader::MemorySource;
    use crate::overlay::MemoryStore;

    fn source_cards(prefix: &str, n: i64) -> Vec<Card> {
        (1..=n)
            .map(|i| {
                let mut card = Card::new(i, format!("{} {}", prefix, i));
                card.recompute_weight();
                card
            })
            .collect()
    }

    fn loader() -> VersionedCatalogLoader<MemorySource> {
        let merc = serde_json::json!({ "version": "3.26", "cards": source_cards("Merc", 12) });
        let keep = serde_json::json!({ "version": "3.27", "cards": source_cards("Keep", 8) });
        VersionedCatalogLoader::new(
            MemorySource::new()
                .with_file("3.26mercenary.json", merc.to_string())
                .with_file("3.27keepers.json", keep.to_string()),
        )
    }

    fn session() -> CatalogSession<MemoryStore> {
        CatalogSession::new(
            CatalogVersion::Mercenary,
            OverlayPersistence::new(MemoryStore::new()),
        )
    }

    fn form(id: i64, name: &str) -> CardForm {
        CardForm {
            id,
            name: name.to_string(),
            reward: "Mirror of Kalandra".to_string(),
            stack_size: 9,
            drop_location: "Uber Boss".to_string(),
            gold_cost: 150.0,
        }
    }

    // =============================================
    // 読み込み・オーバーレイ
    // =============================================

    #[tokio::test]
    async fn test_load_version_from_source() {
        let mut session = session();
        let outcome = session
            .load_version(&loader(), CatalogVersion::Mercenary, true)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            LoadOutcome::Applied {
                version: CatalogVersion::Mercenary,
                cards: 12,
                from_overlay: false
            }
        );
        assert_eq!(session.cards().len(), 12);
    }

    #[tokio::test]
    async fn test_overlay_wins_on_reload() {
        let loader = loader();
        let mut session = session();
        session.load_version(&loader, CatalogVersion::Mercenary, true).await.unwrap();

        // 5枚に減らす（削除ごとにオーバーレイへ書き込まれる）
        for id in 6..=12 {
            assert!(session.delete_card(id));
        }
        assert_eq!(session.cards().len(), 5);

        session.load_version(&loader, CatalogVersion::Mercenary, true).await.unwrap();
        assert_eq!(session.cards().len(), 5);
    }

    #[tokio::test]
    async fn test_reload_from_source_clears_overlay() {
        let loader = loader();
        let mut session = session();
        session.load_version(&loader, CatalogVersion::Mercenary, true).await.unwrap();
        session.delete_card(1);

        let outcome = session.reload_from_source(&loader).await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Applied { cards: 12, from_overlay: false, .. }));
        assert!(session.overlay().load(CatalogVersion::Mercenary).is_none());
    }

    #[tokio::test]
    async fn test_switch_version_swaps_catalog() {
        let loader = loader();
        let mut session = session();
        session.load_version(&loader, CatalogVersion::Mercenary, true).await.unwrap();
        session.load_version(&loader, CatalogVersion::Keepers, true).await.unwrap();

        assert_eq!(session.version(), CatalogVersion::Keepers);
        assert_eq!(session.cards().len(), 8);
        assert_eq!(session.cards()[0].name, "Keep 1");
    }

    #[tokio::test]
    async fn test_failed_load_empties_catalog() {
        let mut session = session();
        session.load_version(&loader(), CatalogVersion::Mercenary, true).await.unwrap();

        let missing = VersionedCatalogLoader::new(MemorySource::new());
        let result = session.load_version(&missing, CatalogVersion::Keepers, true).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(session.cards().is_empty());
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut session = session();
        let first = session.begin_load(CatalogVersion::Mercenary);
        let second = session.begin_load(CatalogVersion::Keepers);

        // 新しい読み込みが先に完了
        let outcome = session
            .finish_load(second, Ok(source_cards("Keep", 8)), true)
            .unwrap();
        assert!(matches!(outcome, LoadOutcome::Applied { cards: 8, .. }));

        // 古い読み込みは破棄される
        let outcome = session
            .finish_load(first, Ok(source_cards("Merc", 12)), true)
            .unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Discarded {
                version: CatalogVersion::Mercenary
            }
        );
        assert_eq!(session.version(), CatalogVersion::Keepers);
        assert_eq!(session.cards().len(), 8);
    }

    #[test]
    fn test_pending_load_keeps_active_version() {
        let mut session = session();
        let ticket = session.begin_load(CatalogVersion::Keepers);
        assert_eq!(session.version(), CatalogVersion::Mercenary);

        session.finish_load(ticket, Ok(source_cards("Keep", 8)), true).unwrap();
        assert_eq!(session.version(), CatalogVersion::Keepers);
    }

    #[test]
    fn test_mutation_during_pending_load_stays_in_its_version() {
        let mut session = session();
        let first = session.begin_load(CatalogVersion::Mercenary);
        session.finish_load(first, Ok(source_cards("Merc", 12)), true).unwrap();

        // 切り替え中の追加は切り替え前のバージョンに属する
        let second = session.begin_load(CatalogVersion::Keepers);
        session.add_card(form(100, "Seven Years Bad Luck")).unwrap();

        let outcome = session
            .finish_load(second, Ok(source_cards("Keep", 8)), true)
            .unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Applied {
                version: CatalogVersion::Keepers,
                cards: 8,
                from_overlay: false
            }
        );
        assert_eq!(session.cards()[0].name, "Keep 1");
        assert!(session.overlay().load(CatalogVersion::Keepers).is_none());

        let merc = session.overlay().load(CatalogVersion::Mercenary).unwrap();
        assert_eq!(merc.len(), 13);
        assert_eq!(merc[12].name, "Seven Years Bad Luck");
    }

    #[test]
    fn test_failed_load_switches_version() {
        let mut session = session();
        let ticket = session.begin_load(CatalogVersion::Keepers);
        let result = session.finish_load(ticket, Err(Error::NotFound("gone".into())), true);

        assert!(result.is_err());
        assert_eq!(session.version(), CatalogVersion::Keepers);
        assert!(session.cards().is_empty());
    }

    #[test]
    fn test_stale_failure_does_not_clear() {
        let mut session = session();
        let first = session.begin_load(CatalogVersion::Mercenary);
        let second = session.begin_load(CatalogVersion::Keepers);
        session.finish_load(second, Ok(source_cards("Keep", 3)), true).unwrap();

        let outcome = session
            .finish_load(first, Err(Error::NotFound("gone".into())), true)
            .unwrap();
        assert!(matches!(outcome, LoadOutcome::Discarded { .. }));
        assert_eq!(session.cards().len(), 3);
    }

    // =============================================
    // 編集コマンド
    // =============================================

    #[test]
    fn test_mutations_write_through() {
        let mut session = session();
        let id = session.suggest_next_id();
        session.add_card(form(id, "House of Mirrors")).unwrap();

        let cached = session.overlay().load(CatalogVersion::Mercenary).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].name, "House of Mirrors");

        session.edit_card(id, form(id, "House of Mirrors (edited)")).unwrap();
        let cached = session.overlay().load(CatalogVersion::Mercenary).unwrap();
        assert_eq!(cached[0].name, "House of Mirrors (edited)");

        session.delete_card(id);
        let cached = session.overlay().load(CatalogVersion::Mercenary).unwrap();
        assert!(cached.is_empty());
    }

    #[test]
    fn test_rejected_mutation_leaves_overlay() {
        let mut session = session();
        session.add_card(form(1, "A")).unwrap();
        let result = session.add_card(form(1, "B"));
        assert!(matches!(result, Err(Error::DuplicateId(1))));

        let cached = session.overlay().load(CatalogVersion::Mercenary).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].name, "A");
    }

    #[test]
    fn test_delete_missing_card_is_noop() {
        let mut session = session();
        assert!(!session.delete_card(99));
        assert!(session.overlay().load(CatalogVersion::Mercenary).is_none());
    }

    #[test]
    fn test_preview_weight() {
        let session = session();
        assert_eq!(session.preview_weight(100.0), Some(10000.0));
        assert_eq!(session.preview_weight(0.0), None);
    }

    // =============================================
    // 入出力
    // =============================================

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let mut session = session();
        session.load_version(&loader(), CatalogVersion::Keepers, true).await.unwrap();
        session.add_card(form(50, "The Fiend")).unwrap();
        let original = session.cards().to_vec();

        let export = session.export().unwrap();
        assert_eq!(export.file_name, "divination_cards_v3.27.json");

        let mut other = self::session();
        let outcome = other.import_json(&export.contents).unwrap();
        assert_eq!(outcome.version, CatalogVersion::Keepers);
        assert_eq!(other.cards(), original.as_slice());
    }

    #[test]
    fn test_round_trip_keeps_infinite_weight() {
        let mut session = session();
        session
            .import_json(r#"{"cards": [{"id": 1, "name": "Zero Stack", "stackSize": 0}]}"#)
            .unwrap();
        assert!(session.cards()[0].weight.is_infinite());

        let export = session.export().unwrap();
        assert!(export.contents.contains("\"weight\": null"));

        let mut other = self::session();
        other.import_json(&export.contents).unwrap();
        assert_eq!(other.cards(), session.cards());
    }

    #[test]
    fn test_export_source_file_name() {
        let session = session();
        let export = session.export_source_file().unwrap();
        assert_eq!(export.file_name, "3.26mercenary.json");
        assert!(export.contents.contains("\"exportDate\""));
    }

    #[test]
    fn test_import_json_without_version_keeps_active() {
        let mut session = session();
        let outcome = session.import_json(r#"{"cards": [{"id": 1, "name": "A"}]}"#).unwrap();
        assert_eq!(outcome.version, CatalogVersion::Mercenary);
        assert_eq!(outcome.cards, 1);
    }

    #[test]
    fn test_import_json_unknown_version_falls_back() {
        let mut session = CatalogSession::new(
            CatalogVersion::Keepers,
            OverlayPersistence::new(MemoryStore::new()),
        );
        let outcome = session
            .import_json(r#"{"version": "3.99", "cards": [{"id": 1, "name": "A"}]}"#)
            .unwrap();

        assert_eq!(outcome.version, CatalogVersion::Mercenary);
        assert_eq!(session.version(), CatalogVersion::Mercenary);
        assert_eq!(session.export().unwrap().file_name, "divination_cards_v3.26.json");
    }

    #[test]
    fn test_import_json_rejects_missing_cards() {
        let mut session = session();
        session.add_card(form(1, "A")).unwrap();

        let result = session.import_json(r#"{"version": "3.27"}"#);
        assert!(matches!(result, Err(Error::Format(_))));
        assert!(session.cards().is_empty());
    }

    #[test]
    fn test_import_csv() {
        let mut session = session();
        let outcome = session.import_csv("Card ID,Name\n1,Foo\n2,Bar").unwrap();
        assert_eq!(outcome.cards, 2);
        assert_eq!(session.cards()[0].weight, 1.44);
        // インポートはオーバーレイに書き込まない
        assert!(session.overlay().load(CatalogVersion::Mercenary).is_none());
    }

    #[test]
    fn test_save_overlay_after_import() {
        let mut session = session();
        session.import_csv("Card ID,Name\n1,Foo").unwrap();
        session.save_overlay().unwrap();

        let cached = session.overlay().load(CatalogVersion::Mercenary).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].name, "Foo");
    }

    #[test]
    fn test_import_invalidates_pending_load() {
        let mut session = session();
        let ticket = session.begin_load(CatalogVersion::Mercenary);
        session.import_csv("id,name\n1,Foo").unwrap();

        let outcome = session.finish_load(ticket, Ok(source_cards("Merc", 12)), true).unwrap();
        assert!(matches!(outcome, LoadOutcome::Discarded { .. }));
        assert_eq!(session.cards().len(), 1);
    }
}
