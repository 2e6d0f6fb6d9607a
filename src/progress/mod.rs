//! Модуль для отслеживания прогресса выполнения конвейера
//!
//! Реализация паттерна Observer для отслеживания прогресса длительных
//! операций: генерации истории, синтеза речи и сборки озвучки.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Этапы конвейера генерации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessStep {
    /// Поиск готовой озвучки в кэше
    CacheLookup,
    /// Генерация текста истории
    StoryGeneration,
    /// Разбиение текста на фрагменты
    TextChunking,
    /// Синтез речи по фрагментам
    SpeechSynthesis,
    /// Сборка итоговой озвучки
    AudioAssembly,
}

impl ProcessStep {
    /// Получить название этапа в виде строки
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheLookup => "cache-lookup",
            Self::StoryGeneration => "story-generation",
            Self::TextChunking => "text-chunking",
            Self::SpeechSynthesis => "speech-synthesis",
            Self::AudioAssembly => "audio-assembly",
        }
    }

    /// Вес этапа в общем прогрессе (сумма весов равна 100)
    fn weight(&self) -> f32 {
        match self {
            Self::CacheLookup => 5.0,
            Self::StoryGeneration => 35.0,
            Self::TextChunking => 5.0,
            Self::SpeechSynthesis => 45.0,
            Self::AudioAssembly => 10.0,
        }
    }

    /// Суммарный вес всех предыдущих этапов
    fn offset(&self) -> f32 {
        const ORDER: [ProcessStep; 5] = [
            ProcessStep::CacheLookup,
            ProcessStep::StoryGeneration,
            ProcessStep::TextChunking,
            ProcessStep::SpeechSynthesis,
            ProcessStep::AudioAssembly,
        ];
        ORDER
            .iter()
            .take_while(|s| **s != *self)
            .map(|s| s.weight())
            .sum()
    }
}

/// Информация о прогрессе выполнения операции
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Текущий этап операции
    pub step: String,
    /// Процент выполнения текущего этапа (0.0 - 100.0)
    pub step_progress: f32,
    /// Общий процент выполнения всей операции (0.0 - 100.0)
    pub total_progress: f32,
    /// Дополнительная информация о текущем этапе
    pub details: Option<String>,
}

/// Трейт для наблюдателя, получающего уведомления о прогрессе
pub trait ProgressObserver: Send + Sync {
    /// Метод, вызываемый при обновлении прогресса
    fn on_progress_update(&self, progress: ProgressInfo);
}

/// Трекер прогресса конвейера
///
/// Держит список наблюдателей и текущий этап; потокобезопасен.
pub struct ProgressTracker {
    observers: RwLock<Vec<Box<dyn ProgressObserver>>>,
    current_step: RwLock<ProcessStep>,
    notifications: AtomicUsize,
}

impl ProgressTracker {
    /// Создать новый трекер без наблюдателей
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            current_step: RwLock::new(ProcessStep::CacheLookup),
            notifications: AtomicUsize::new(0),
        }
    }

    /// Добавить наблюдателя
    pub fn add_observer(&self, observer: Box<dyn ProgressObserver>) {
        if let Ok(mut observers) = self.observers.write() {
            observers.push(observer);
        }
    }

    /// Переключиться на следующий этап
    pub fn set_step(&self, step: ProcessStep) {
        if let Ok(mut current) = self.current_step.write() {
            *current = step;
        }
        self.update_step_progress(0.0, None);
    }

    /// Обновить прогресс текущего этапа
    pub fn update_step_progress(&self, step_progress: f32, details: Option<String>) {
        let step = match self.current_step.read() {
            Ok(step) => *step,
            Err(_) => return,
        };

        let step_progress = step_progress.clamp(0.0, 100.0);
        let total = step.offset() + step.weight() * step_progress / 100.0;

        self.notify(ProgressInfo {
            step: step.as_str().to_string(),
            step_progress,
            total_progress: total.clamp(0.0, 100.0),
            details,
        });
    }

    /// Отметить завершение всей операции
    pub fn complete(&self) {
        self.notify(ProgressInfo {
            step: "completed".to_string(),
            step_progress: 100.0,
            total_progress: 100.0,
            details: None,
        });
    }

    /// Количество отправленных уведомлений
    pub fn notification_count(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    fn notify(&self, progress: ProgressInfo) {
        self.notifications.fetch_add(1, Ordering::SeqCst);
        if let Ok(observers) = self.observers.read() {
            for observer in observers.iter() {
                observer.on_progress_update(progress.clone());
            }
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        seen: Arc<Mutex<Vec<ProgressInfo>>>,
    }

    impl ProgressObserver for Recorder {
        fn on_progress_update(&self, progress: ProgressInfo) {
            self.seen.lock().unwrap().push(progress);
        }
    }

    #[test]
    fn test_weights_sum_to_one_hundred() {
        let total: f32 = [
            ProcessStep::CacheLookup,
            ProcessStep::StoryGeneration,
            ProcessStep::TextChunking,
            ProcessStep::SpeechSynthesis,
            ProcessStep::AudioAssembly,
        ]
        .iter()
        .map(|s| s.weight())
        .sum();
        assert!((total - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_total_progress_is_monotonic_across_steps() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tracker = ProgressTracker::new();
        tracker.add_observer(Box::new(Recorder { seen: seen.clone() }));

        tracker.set_step(ProcessStep::StoryGeneration);
        tracker.update_step_progress(100.0, None);
        tracker.set_step(ProcessStep::SpeechSynthesis);
        tracker.update_step_progress(50.0, Some("3/6".to_string()));
        tracker.complete();

        let seen = seen.lock().unwrap();
        let totals: Vec<f32> = seen.iter().map(|p| p.total_progress).collect();
        let mut sorted = totals.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(totals, sorted, "total progress went backwards: {:?}", totals);
        assert_eq!(seen.last().unwrap().total_progress, 100.0);
    }
}
