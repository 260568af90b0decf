use chrono::{DateTime, Utc};
use log::debug;

use crate::bus::{BusHandle, ZbusHandle};
use crate::core::convert;
use crate::core::proxy::{Interface, ProxyObject, Singleton};
use crate::types::constants::timedate;
use crate::Result;

/// `org.freedesktop.timedate1`.
#[derive(Debug)]
pub struct TimedateInterface;

impl Interface for TimedateInterface {
    const SERVICE: &'static str = timedate::SERVICE;
    const NAME: &'static str = timedate::INTERFACE;
}

impl Singleton for TimedateInterface {
    const PATH: &'static str = timedate::PATH;
}

/// systemd-timedated: host clock, time zone and NTP.
pub type TimeDate<H = ZbusHandle> = ProxyObject<H, TimedateInterface>;

impl<H: BusHandle> ProxyObject<H, TimedateInterface> {
    pub fn timezone(&self) -> Result<String> {
        self.property(timedate::TIMEZONE, convert::text)
    }

    /// Whether NTP synchronization is enabled.
    pub fn ntp(&self) -> Result<bool> {
        self.property(timedate::NTP, convert::boolean)
    }

    pub fn ntp_synchronized(&self) -> Result<bool> {
        self.property(timedate::NTP_SYNCHRONIZED, convert::boolean)
    }

    /// Host clock as of the last refresh.
    pub fn dt_utc(&self) -> Result<DateTime<Utc>> {
        self.property(timedate::TIME_USEC, convert::usec_datetime)
    }

    /// Sets the host clock to an absolute UTC time.
    pub async fn set_time(&self, utc: DateTime<Utc>) -> Result<()> {
        debug!("Setting host time to {utc}");
        self.call("SetTime", &(utc.timestamp_micros(), false, false))
            .await
    }

    pub async fn set_ntp(&self, use_ntp: bool) -> Result<()> {
        debug!("Setting NTP to {use_ntp}");
        self.call("SetNTP", &(use_ntp, false)).await
    }
}
