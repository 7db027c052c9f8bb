mod logging;
mod mission;
mod sequencer;
mod swarm;

use clap::{Arg, Command};
use logging::{init_logging, verbosity_to_level, LogConfig, LogOutput};
use mission::{
    ControlConfig, GainSet, MissionConfig, MissionMeta, MissionMode, Position2D, SwarmConfig,
};
use sequencer::MissionSequencer;
use std::str::FromStr;
use swarm::traits::IStateProvider;
use swarm::{AgentId, ClampPolicy, KinematicProvider};

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("swarmctl")
        .version("0.1.0")
        .about("群制御 (Swarm Velocity Controller)")
        .long_about("マルチコプタ群の分散速度合成コントローラ\n\
                     分離・凝集・反発の力則と目標指向ベクトルを毎ティック合成し、\n\
                     移動・編隊・カバレッジの各ミッションを実行します。")
        .arg(
            Arg::new("mission")
                .short('m')
                .long("mission")
                .value_name("FILE")
                .help("ミッションファイル(.yaml)のパスを指定")
                .long_help("実行するミッションファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、利用可能なミッション一覧を表示します。")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("ミッションの情報のみ表示して終了")
                .conflicts_with("test")
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(clap::ArgAction::SetTrue)
                .help("内蔵プロバイダによるセルフテストを実行")
                .conflicts_with("info")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .arg(
            Arg::new("log")
                .long("log")
                .value_name("DEST")
                .help("ログ出力先 (console / file / both)")
        )
        .get_matches();

    println!("群制御 (Swarm Velocity Controller) - swarmctl v0.1.0");
    println!();

    let verbose_level = matches.get_count("verbose");

    // ログシステムの初期化
    let log_output = matches
        .get_one::<String>("log")
        .map(|s| LogOutput::from_str(s))
        .transpose()
        .unwrap_or_else(|e| {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        })
        .unwrap_or(LogOutput::Console);

    let log_config = LogConfig {
        level: verbosity_to_level(verbose_level),
        output: log_output,
        ..LogConfig::default()
    };
    if let Err(e) = init_logging(log_config) {
        eprintln!("ログ初期化エラー: {}", e);
        std::process::exit(1);
    }

    // セルフテストモードの実行
    if matches.get_flag("test") {
        println!("=== セルフテストモード ===");
        match run_self_test(verbose_level) {
            Ok(_) => println!("\nセルフテストが正常に完了しました！"),
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // ミッションファイルの処理
    if let Some(mission_path) = matches.get_one::<String>("mission") {
        match run_mission(mission_path, matches.get_flag("info"), verbose_level) {
            Ok(_) => {
                if verbose_level > 0 {
                    println!("ミッション実行が正常に完了しました。");
                }
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        // デフォルト動作: 利用可能なミッション一覧を表示
        show_default_help();
    }
}

/// ミッションファイルを読み込んで実行
fn run_mission(
    mission_path: &str,
    info_only: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = MissionConfig::from_file(mission_path)?;

    if verbose_level > 0 {
        println!("ミッションファイル読み込み完了: {}", mission_path);
    }

    if info_only {
        config.print_summary();
        return Ok(());
    }

    config.print_summary();
    println!();

    // 外部シミュレータ接続層は本体に含まれないため、原点オフセット位置に
    // 静止した内蔵運動学プロバイダでミッションを駆動する
    let initial_positions = config
        .swarm
        .origins
        .iter()
        .map(|_| (0.0, 0.0, 0.0))
        .collect();
    let provider = KinematicProvider::new(initial_positions);

    let mut sequencer = MissionSequencer::new(config, provider, verbose_level);
    sequencer.initialize()?;
    sequencer.run()?;

    Ok(())
}

/// 内蔵プロバイダによるセルフテスト
///
/// 正三角形に配置した3機を原点へ移動させる最小ミッションを実行し、
/// 全機が目標へ近づくことを確認します。
fn run_self_test(verbose_level: u8) -> Result<(), Box<dyn std::error::Error>> {
    let config = MissionConfig {
        meta: MissionMeta {
            version: "1.0".to_string(),
            name: "self_test".to_string(),
            description: "内蔵プロバイダによる移動ミッションの動作確認".to_string(),
        },
        swarm: SwarmConfig {
            num_agents: 3,
            origins: vec![Position2D { x_m: 0.0, y_m: 0.0 }; 3],
        },
        gains: GainSet {
            v_max_mps: 5.0,
            r_max_m: 20.0,
            k_sep: 0.3,
            k_coh: 0.05,
            k_mig: 1.0,
            k_rep: 3.0,
            r_repulsion_m: 4.0,
            d_desired_m: 3.0,
        },
        control: ControlConfig {
            tick_count: 100,
            command_duration_s: 0.1,
        },
        mode: MissionMode::Migration {
            target: Position2D { x_m: 0.0, y_m: 0.0 },
        },
        clamp_policy: ClampPolicy::default(),
        repulsion_weight: 1.0,
    };
    config.validate()?;

    let provider = KinematicProvider::new(vec![
        (30.0, 0.0, -10.0),
        (-15.0, 26.0, -10.0),
        (-15.0, -26.0, -10.0),
    ]);

    let mut sequencer = MissionSequencer::new(config, provider, verbose_level);
    sequencer.initialize()?;
    sequencer.run()?;

    println!("\n最終位置:");
    for agent in AgentId::all(3) {
        let (x, y, z) = sequencer.provider().get_position(agent)?;
        println!("  {}: ({:.1}, {:.1}, {:.1})", agent, x, y, z);
    }

    Ok(())
}

/// デフォルトヘルプとミッション一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  swarmctl [オプション]");
    println!();
    println!("オプション:");
    println!("  -m, --mission <FILE>   ミッションファイルを指定して実行");
    println!("  -i, --info             ミッション情報のみ表示");
    println!("  -t, --test             内蔵プロバイダによるセルフテスト実行");
    println!("  -v, --verbose          詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log <DEST>       ログ出力先 (console / file / both)");
    println!("  -h, --help             このヘルプを表示");
    println!();
    println!("利用可能なミッションファイル:");
    println!("  missions/mission_migration.yaml        - 固定目標点への移動");
    println!("  missions/mission_circle_orbit.yaml     - 円編隊の周回飛行");
    println!("  missions/mission_v_orbit.yaml          - V字編隊の周回飛行");
    println!("  missions/mission_coverage.yaml         - ボロノイ分割による空間分担");
    println!("  missions/mission_line_search.yaml      - 横一列編隊による捜索");
    println!();
    println!("例:");
    println!("  swarmctl -m missions/mission_migration.yaml");
    println!("  swarmctl -m missions/mission_v_orbit.yaml -v");
    println!("  swarmctl -m missions/mission_coverage.yaml -i");
    println!("  swarmctl --test");
}
