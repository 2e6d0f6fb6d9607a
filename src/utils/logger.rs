use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

pub fn init_logger() {
    // Установка базового фильтра и переопределение через переменные окружения
    let env = Env::default().filter_or("RUST_LOG", "warn,storynova=info");

    let mut builder = Builder::from_env(env);

    // Явно подавляем шумные логи HTTP-стека
    builder
        .filter_module("mio", LevelFilter::Error)
        .filter_module("tokio_util", LevelFilter::Error)
        .filter_module("hyper", LevelFilter::Error)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("rustls", LevelFilter::Warn)
        // Форматирование логов
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    // try_init, чтобы повторная инициализация в тестах не приводила к панике
    let _ = builder.try_init();
}
