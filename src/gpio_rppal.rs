//! Raspberry Pi GPIO backends for the LED and the button (rppal, BCM numbering).

use rain_led_lib::actuator::Actuator;
use rain_led_lib::config::HardwareConfig;
use rain_led_lib::input::{drain_edges, InputSource};
use rain_led_lib::ActuatorError;
use rppal::gpio::{Gpio, InputPin, OutputPin, Trigger};
use std::time::Duration;
use tracing::info;

fn gpio_err(e: rppal::gpio::Error) -> ActuatorError {
    ActuatorError::Io(e.to_string())
}

pub struct GpioLed {
    pin: OutputPin,
}

pub struct GpioButton {
    pin: InputPin,
}

/// Claim both pins. Fails when /dev/gpiomem is missing or a pin is busy.
pub fn open(hw: &HardwareConfig) -> Result<(GpioLed, GpioButton), ActuatorError> {
    let gpio = Gpio::new().map_err(gpio_err)?;
    let led = GpioLed::new(&gpio, hw.led_pin)?;
    let button = GpioButton::new(&gpio, hw.button_pin)?;
    info!(led = hw.led_pin, button = hw.button_pin, "GPIO pins claimed");
    Ok((led, button))
}

impl GpioLed {
    pub fn new(gpio: &Gpio, bcm: u8) -> Result<Self, ActuatorError> {
        let pin = gpio.get(bcm).map_err(gpio_err)?.into_output_low();
        Ok(Self { pin })
    }
}

impl Actuator for GpioLed {
    fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

impl GpioButton {
    /// Pull-down input with a kernel-latched rising-edge interrupt.
    pub fn new(gpio: &Gpio, bcm: u8) -> Result<Self, ActuatorError> {
        let mut pin = gpio.get(bcm).map_err(gpio_err)?.into_input_pulldown();
        pin.set_interrupt(Trigger::RisingEdge).map_err(gpio_err)?;
        Ok(Self { pin })
    }
}

impl InputSource for GpioButton {
    fn take_edge(&mut self) -> Result<bool, ActuatorError> {
        // Zero timeout: empty the kernel queue without blocking
        drain_edges(|| {
            self.pin
                .poll_interrupt(false, Some(Duration::ZERO))
                .map_err(gpio_err)
        })
    }
}
