/*
    Moving Average Filter
    - Rolling window over per-tick encoder deltas
    - Averages over the filled part of the window until it wraps once
*/

pub struct MovingAverage<const N: usize> {
    buffer: [i32; N],
    index: usize,
    is_filled: bool,
    sum: i64,
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            index: 0,
            is_filled: false,
            sum: 0,
        }
    }

    pub fn reset(&mut self) {
        self.buffer = [0; N];
        self.index = 0;
        self.is_filled = false;
        self.sum = 0;
    }

    /// Pushes one sample and returns the current window mean.
    pub fn update(&mut self, value: i32) -> f32 {
        if self.is_filled {
            self.sum -= self.buffer[self.index] as i64;
        }

        self.buffer[self.index] = value;
        self.sum += value as i64;

        self.index = (self.index + 1) % N;

        if !self.is_filled && self.index == 0 {
            self.is_filled = true;
        }

        return self.average();
    }

    pub fn average(&self) -> f32 {
        let count = self.len();
        if count == 0 {
            return 0.0;
        }
        self.sum as f32 / count as f32
    }

    pub fn len(&self) -> usize {
        if self.is_filled { N } else { self.index }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_filled(&self) -> bool {
        self.is_filled
    }
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}
