use clap::Parser;
use divination_common::weight::{legacy_weight, weight_from_gold_cost, HIGH_COST_THRESHOLD};
use divination_common::{CardForm, CatalogSnapshot, CatalogVersion, KeyValueStore, LoadOutcome};
use divination_index::{catalog, cli, config, display, error, logging};
use catalog::Catalog;
use cli::{Cli, Commands, ImportFormat};
use config::Config;
use error::{DivinationError, Result};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::load()?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    let version = CatalogVersion::resolve(
        cli.league.as_deref().unwrap_or(&config.default_version),
    );
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        cache_dir = %config.resolved_cache_dir().display(),
        version = %version,
        "configuration loaded"
    );

    match cli.command {
        Commands::Versions => {
            println!("対応バージョン:");
            for v in CatalogVersion::ALL {
                let marker = if v == version { "*" } else { " " };
                println!("{} {:<6} {:<30} {}", marker, v.id(), v.label(), v.source_file());
            }
        }

        Commands::List { search, sort } => {
            let mut catalog = Catalog::open(&config, version);
            print_load_outcome(catalog.load(true).await?);

            let mut last_sort = None;
            for column in sort {
                last_sort = Some(catalog.session.sort(column));
            }

            let cards = match search.as_deref() {
                Some(term) => catalog.session.search(term),
                None => catalog.session.cards().iter().collect(),
            };

            print!("{}", display::render_table(&cards));
            print!("\n{}件", cards.len());
            if let Some(spec) = last_sort {
                print!(" (ソート: {})", display::format_sort(&spec));
            }
            println!();
        }

        Commands::Show { id } => {
            let mut catalog = Catalog::open(&config, version);
            catalog.load(true).await?;

            let card = catalog
                .session
                .store()
                .get(id)
                .ok_or(divination_common::Error::CardNotFound(id))?;
            print!("{}", display::render_card(card));
        }

        Commands::Add { id, fields } => {
            let mut catalog = Catalog::open(&config, version);
            catalog.load(true).await?;

            let form = CardForm {
                id: id.unwrap_or_else(|| catalog.session.suggest_next_id()),
                name: fields.name,
                reward: fields.reward,
                stack_size: fields.stack_size,
                drop_location: fields.drop_location,
                gold_cost: fields.gold_cost,
            };
            let card = catalog.session.add_card(form)?;
            println!(
                "✔ カードを追加しました: #{} {} (重み: {})",
                card.id,
                card.name,
                display::format_weight(card.weight)
            );
        }

        Commands::Edit { id, new_id, fields } => {
            let mut catalog = Catalog::open(&config, version);
            catalog.load(true).await?;

            let existing = catalog
                .session
                .store()
                .get(id)
                .ok_or(divination_common::Error::CardNotFound(id))?;

            // 現在値をフォームに読み込んでから指定フィールドを上書き
            let mut form = CardForm::from(existing);
            if let Some(new_id) = new_id {
                form.id = new_id;
            }
            if let Some(name) = fields.name {
                form.name = name;
            }
            if let Some(reward) = fields.reward {
                form.reward = reward;
            }
            if let Some(stack_size) = fields.stack_size {
                form.stack_size = stack_size;
            }
            if let Some(drop_location) = fields.drop_location {
                form.drop_location = drop_location;
            }
            if let Some(gold_cost) = fields.gold_cost {
                form.gold_cost = gold_cost;
            }

            let card = catalog.session.edit_card(id, form)?;
            println!(
                "✔ カードを更新しました: #{} {} (重み: {})",
                card.id,
                card.name,
                display::format_weight(card.weight)
            );
        }

        Commands::Delete { id, yes } => {
            let mut catalog = Catalog::open(&config, version);
            catalog.load(true).await?;

            let Some(card) = catalog.session.store().get(id) else {
                println!("カード #{} は存在しません", id);
                return Ok(());
            };

            if !yes {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt(format!("#{} {} を削除しますか？", card.id, card.name))
                    .default(false)
                    .interact()
                    .map_err(|e| DivinationError::Prompt(e.to_string()))?;
                if !confirmed {
                    println!("キャンセルしました");
                    return Ok(());
                }
            }

            catalog.session.delete_card(id);
            println!("✔ カード #{} を削除しました", id);
        }

        Commands::Weight { gold_cost, stack_size, reward, drop_location } => {
            match gold_cost.and_then(weight_from_gold_cost) {
                Some(weight) => {
                    let formula = if gold_cost.unwrap_or_default() < HIGH_COST_THRESHOLD {
                        "1,000,000 / goldCost"
                    } else {
                        "13e9 / goldCost³ と 13e9 / (goldCost + 24.99)³ の平均"
                    };
                    println!("重み: {} ({})", display::format_weight(weight), formula);
                }
                None => {
                    let weight = legacy_weight(stack_size, &reward, &drop_location);
                    println!("重み: {} (レガシー推定)", display::format_weight(weight));
                }
            }
        }

        Commands::Reload => {
            let mut catalog = Catalog::open(&config, version);
            let outcome = catalog.reload_from_source().await?;
            print_load_outcome(outcome);
            println!("✅ ソースデータから再読み込みしました");
        }

        Commands::Cache { clear, info } => {
            let mut catalog = Catalog::open(&config, version);
            let overlay = catalog.session.overlay();
            let key = overlay.key(version);
            let cache_path = overlay.store().path_for(&key);

            if info || !clear {
                // デフォルトまたは--info: 情報表示
                match overlay.store().get(&key) {
                    Ok(Some(raw)) => {
                        println!("キャッシュ情報:");
                        println!("  バージョン: {}", version.label());
                        println!("  パス: {}", cache_path.display());
                        match serde_json::from_str::<CatalogSnapshot>(&raw) {
                            Ok(snapshot) => {
                                println!("  件数: {}", snapshot.cards.len());
                                println!("  保存日時: {}", format_export_date(&snapshot.export_date));
                            }
                            Err(e) => println!("  破損しています（読み込み時は無視されます）: {}", e),
                        }
                    }
                    Ok(None) => println!("キャッシュファイルが存在しません: {}", cache_path.display()),
                    Err(e) => println!("キャッシュ読み込みエラー: {}", e),
                }
            }

            if clear {
                if catalog.session.clear_cache() {
                    println!("✔ キャッシュを削除しました: {}", cache_path.display());
                } else {
                    println!("キャッシュファイルが存在しません");
                }
            }
        }

        Commands::Export { output, as_source } => {
            let mut catalog = Catalog::open(&config, version);
            catalog.load(true).await?;

            let document = if as_source {
                catalog.session.export_source_file()?
            } else {
                catalog.session.export()?
            };

            let output = output.unwrap_or_else(|| PathBuf::from("."));
            let output_path = output_path_for(&output, &document.file_name);
            std::fs::write(&output_path, &document.contents)?;
            println!(
                "✔ {}枚をエクスポート: {}",
                catalog.session.cards().len(),
                output_path.display()
            );
        }

        Commands::Import { input, format } => {
            if !input.exists() {
                return Err(DivinationError::FileNotFound(input.display().to_string()));
            }
            let content = std::fs::read_to_string(&input)?;
            let format = format.unwrap_or_else(|| ImportFormat::from_path(&input));

            let mut catalog = Catalog::open(&config, version);
            let outcome = match format {
                ImportFormat::Json => catalog.session.import_json(&content),
                ImportFormat::Csv => catalog.session.import_csv(&content),
            }
            .inspect_err(|e| {
                tracing::error!(file = %input.display(), format = %format, error = %e, "import failed")
            })?;

            // CLIはプロセスごとに状態を持たないため、インポート結果をそのまま保存する
            catalog.session.save_overlay()?;
            println!(
                "✔ {}枚を読み込みました ({} / {})",
                outcome.cards,
                outcome.version.label(),
                format
            );
        }

        Commands::Config { set_data_dir, set_version, show } => {
            if let Some(dir) = set_data_dir {
                config.set_data_dir(dir)?;
                println!("✔ データフォルダを設定しました");
            }

            if let Some(v) = set_version {
                config.set_default_version(v)?;
                println!("✔ デフォルトバージョンを設定しました");
            }

            if show {
                println!("設定:");
                println!("  データフォルダ: {}", config.data_dir.display());
                println!("  キャッシュ: {}", config.resolved_cache_dir().display());
                println!("  デフォルトバージョン: {}", config.default_version);
                println!("  キャッシュ名前空間: {}", config.cache_namespace);
            }
        }
    }

    Ok(())
}

fn print_load_outcome(outcome: LoadOutcome) {
    if let LoadOutcome::Applied { version, cards, from_overlay } = outcome {
        let origin = if from_overlay { "ローカル編集" } else { "ソースデータ" };
        println!("📖 {} - {}枚 ({})\n", version.label(), cards, origin);
    }
}

fn output_path_for(output: &Path, file_name: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(file_name)
    } else {
        output.to_path_buf()
    }
}

fn format_export_date(export_date: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(export_date)
        .map(|d| d.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| export_date.to_string())
}
